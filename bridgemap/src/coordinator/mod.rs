//! Incremental fetch coordination.
//!
//! [`FetchCoordinator`] is the single orchestrator behind viewport-driven
//! loading: on every settled viewport it enumerates the covering tiles,
//! diffs them against the per-context fetch cache, claims the unseen tiles,
//! fetches only those through the injected [`TileFetcher`], and merges the
//! results into the deduplicated store.
//!
//! # Concurrency
//!
//! Calls to [`FetchCoordinator::on_viewport_settled`] may overlap; the only
//! suspension point is the fetch-capability call. All cache and store
//! mutation happens under one mutex that is never held across that await.
//! New tiles are marked fetched *before* the suspension point, so a second
//! settle arriving while an earlier fetch is still pending never re-requests
//! the same tile: at most one fetch is ever in flight per (context, tile)
//! pair.
//!
//! Responses are tagged with the reset epoch they were issued under. A
//! filter change or cache clear while a fetch is in flight bumps the epoch,
//! and the late response is discarded instead of leaking stale-context
//! entities into the fresh store.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::FetchCache;
use crate::coord::CoordError;
use crate::fetch::{FetchMode, TileFetcher};
use crate::filter::FilterSettings;
use crate::store::{Entity, ResultStore};
use crate::viewport::{self, ViewportBounds};

/// Default zoom level at which fetches switch from coarse to fine mode.
pub const DEFAULT_FINE_MODE_ZOOM: u8 = 10;

/// What to do with a batch's claimed tiles when its fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Leave failed tiles marked; they are treated as "no data here" until
    /// a full cache clear.
    #[default]
    None,
    /// Unmark the failed batch's tiles so a later viewport settle requests
    /// them again.
    UnmarkOnFailure,
}

/// Coordinator configuration.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Zoom threshold for fetch granularity: below this zoom batches are
    /// requested in coarse mode, at or above it in fine mode.
    pub fine_mode_zoom: u8,
    /// Handling of claimed tiles after a failed fetch.
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            fine_mode_zoom: DEFAULT_FINE_MODE_ZOOM,
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of one viewport-settle cycle, for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleOutcome {
    /// Tiles in the viewport that were not yet cached and got claimed.
    pub new_tiles: usize,
    /// Entities actually inserted into the store this cycle.
    pub entities_added: usize,
    /// Fetch mode used, or `None` when no fetch was issued.
    pub mode: Option<FetchMode>,
}

impl SettleOutcome {
    fn nothing_new() -> Self {
        Self {
            new_tiles: 0,
            entities_added: 0,
            mode: None,
        }
    }
}

/// State guarded by the coordinator mutex.
///
/// `epoch` increments on every reset; in-flight fetches compare it on
/// resolution to detect that their context has been invalidated.
#[derive(Debug, Default)]
struct CoordinatorState {
    filters: FilterSettings,
    cache: FetchCache,
    store: ResultStore,
    epoch: u64,
}

/// Viewport-driven incremental fetch coordinator.
///
/// Owns the fetch cache and result store; constructed once per session and
/// shared (via `Arc`) between the viewport notifier and the rendering layer.
pub struct FetchCoordinator {
    config: CoordinatorConfig,
    fetcher: Arc<dyn TileFetcher>,
    state: Mutex<CoordinatorState>,
}

impl FetchCoordinator {
    /// Create a coordinator with default filters and configuration.
    pub fn new(fetcher: Arc<dyn TileFetcher>) -> Self {
        Self::with_config(fetcher, CoordinatorConfig::default())
    }

    /// Create a coordinator with an explicit configuration.
    pub fn with_config(fetcher: Arc<dyn TileFetcher>, config: CoordinatorConfig) -> Self {
        Self {
            config,
            fetcher,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    /// The currently active filter settings.
    pub fn filters(&self) -> FilterSettings {
        self.state.lock().filters
    }

    /// Switch to new filter settings.
    ///
    /// A change of settings invalidates all tile knowledge: the fetch cache
    /// and the result store are reset together. Setting identical values is
    /// a no-op.
    pub fn set_filters(&self, filters: FilterSettings) {
        let mut state = self.state.lock();
        if state.filters == filters {
            return;
        }
        debug!(from = %state.filters, to = %filters, "filter context changed, resetting");
        state.filters = filters;
        state.cache.clear();
        state.store.reset();
        state.epoch += 1;
    }

    /// Discard all cached tile knowledge and accumulated entities.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.store.reset();
        state.epoch += 1;
    }

    /// Snapshot of the current deduplicated entity collection, in insertion
    /// order.
    pub fn entities(&self) -> Vec<Entity> {
        self.state.lock().store.entities().cloned().collect()
    }

    /// Number of distinct entities currently stored.
    pub fn entity_count(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Handle a settled viewport change.
    ///
    /// Enumerates the covering tiles, claims the ones not yet requested
    /// under the active filter context, and fetches only those. Fetch
    /// failures are logged and degrade to an empty batch; only degenerate
    /// viewport bounds surface as an error.
    pub async fn on_viewport_settled(
        &self,
        bounds: &ViewportBounds,
        zoom: u8,
    ) -> Result<SettleOutcome, CoordError> {
        let keys = viewport::tiles_in_viewport(bounds, zoom)?;

        // Claim phase: diff and mark synchronously, before any await, so
        // overlapping settle calls can never double-request a tile.
        let (filters, epoch, new_keys) = {
            let mut state = self.state.lock();
            let filters = state.filters;
            let new_keys: Vec<_> = keys
                .into_iter()
                .filter(|key| !state.cache.has_tile(&filters, key))
                .collect();
            for key in &new_keys {
                state.cache.mark_fetched(&filters, *key);
            }
            (filters, state.epoch, new_keys)
        };

        if new_keys.is_empty() {
            debug!(zoom, "viewport fully cached, no fetch");
            return Ok(SettleOutcome::nothing_new());
        }

        let mode = FetchMode::for_zoom(zoom, self.config.fine_mode_zoom);
        debug!(zoom, tiles = new_keys.len(), %mode, context = %filters, "fetching new tiles");

        match self
            .fetcher
            .fetch_tiles(zoom, &new_keys, &filters, mode)
            .await
        {
            Ok(entities) => {
                let mut state = self.state.lock();
                if state.epoch != epoch {
                    debug!(
                        context = %filters,
                        "discarding response from invalidated context"
                    );
                    return Ok(SettleOutcome {
                        new_tiles: new_keys.len(),
                        entities_added: 0,
                        mode: Some(mode),
                    });
                }

                let received = entities.len();
                let entities_added = state.store.merge(entities);
                info!(
                    zoom,
                    tiles = new_keys.len(),
                    received,
                    added = entities_added,
                    total = state.store.len(),
                    "merged batch"
                );
                Ok(SettleOutcome {
                    new_tiles: new_keys.len(),
                    entities_added,
                    mode: Some(mode),
                })
            }
            Err(e) => {
                warn!(zoom, tiles = new_keys.len(), error = %e, "tile fetch failed");
                if self.config.retry == RetryPolicy::UnmarkOnFailure {
                    let mut state = self.state.lock();
                    if state.epoch == epoch {
                        for key in &new_keys {
                            state.cache.unmark(&filters, key);
                        }
                    }
                }
                Ok(SettleOutcome {
                    new_tiles: new_keys.len(),
                    entities_added: 0,
                    mode: Some(mode),
                })
            }
        }
    }
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FetchCoordinator")
            .field("config", &self.config)
            .field("filters", &state.filters)
            .field("cached_contexts", &state.cache.context_count())
            .field("entities", &state.store.len())
            .finish()
    }
}
