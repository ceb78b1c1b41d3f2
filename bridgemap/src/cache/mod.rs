//! Per-context fetch cache.
//!
//! [`FetchCache`] remembers which tiles have already been requested under
//! each filter context. Within a context the cache only grows: a marked
//! tile is never re-requested until a full [`FetchCache::clear`]. The cache
//! deliberately records *requested*, not *succeeded* — a failed fetch is
//! indistinguishable from a successful empty one, which is what makes the
//! mark-then-fetch claim in the coordinator race-free.

use std::collections::{HashMap, HashSet};

use crate::filter::FilterSettings;
use crate::tile::TileKey;

/// Tracks which tile keys have been requested per filter context.
#[derive(Debug, Default)]
pub struct FetchCache {
    contexts: HashMap<FilterSettings, HashSet<TileKey>>,
}

impl FetchCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tile has already been requested under this context.
    pub fn has_tile(&self, context: &FilterSettings, key: &TileKey) -> bool {
        self.contexts
            .get(context)
            .map(|tiles| tiles.contains(key))
            .unwrap_or(false)
    }

    /// Mark a tile as requested under this context.
    ///
    /// Idempotent: marking an already-marked pair is a no-op. Returns `true`
    /// if the tile was newly marked.
    pub fn mark_fetched(&mut self, context: &FilterSettings, key: TileKey) -> bool {
        self.contexts.entry(*context).or_default().insert(key)
    }

    /// Remove a single tile from a context.
    ///
    /// Exists solely for [`RetryPolicy::UnmarkOnFailure`]; the default
    /// coordinator configuration never calls this, keeping the cache
    /// monotone within a context's lifetime.
    ///
    /// [`RetryPolicy::UnmarkOnFailure`]: crate::coordinator::RetryPolicy::UnmarkOnFailure
    pub fn unmark(&mut self, context: &FilterSettings, key: &TileKey) -> bool {
        self.contexts
            .get_mut(context)
            .map(|tiles| tiles.remove(key))
            .unwrap_or(false)
    }

    /// Discard all contexts and all tiles.
    pub fn clear(&mut self) {
        self.contexts.clear();
    }

    /// Number of contexts currently tracked.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Number of tiles marked under the given context.
    pub fn tile_count(&self, context: &FilterSettings) -> usize {
        self.contexts.get(context).map(HashSet::len).unwrap_or(0)
    }
}
