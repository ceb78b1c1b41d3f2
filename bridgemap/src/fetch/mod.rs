//! The tile fetch capability boundary.
//!
//! The coordinator never talks to a backend directly; it is handed an
//! implementation of [`TileFetcher`]. The trait uses `Pin<Box<dyn Future>>`
//! returns so it stays dyn-compatible and can be injected as
//! `Arc<dyn TileFetcher>`, with mock implementations in tests.

mod http;

pub use http::HttpTileFetcher;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::filter::FilterSettings;
use crate::store::Entity;
use crate::tile::TileKey;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Query granularity for a batch of newly visible tiles.
///
/// Wide, low-detail views aggregate one ranked top-N across the whole batch;
/// detailed views rank top-N per tile so per-cell density is preserved. The
/// coordinator selects the mode from the zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// One ranked top-N aggregated across all requested tiles combined.
    Coarse,
    /// Ranked top-N independently for each requested tile.
    Fine,
}

impl FetchMode {
    /// Selects the mode for a zoom level: below `threshold` is coarse, at
    /// or above it is fine.
    pub fn for_zoom(zoom: u8, threshold: u8) -> Self {
        if zoom < threshold {
            FetchMode::Coarse
        } else {
            FetchMode::Fine
        }
    }

    /// The wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Coarse => "coarse",
            FetchMode::Fine => "fine",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a fetch capability.
///
/// Never fatal to the coordinator: a failed batch degrades to zero entities
/// for that round.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, read).
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the backend.
    #[error("backend returned HTTP {status} for {url}")]
    Status {
        /// The HTTP status code received.
        status: u16,
        /// The request URL.
        url: String,
    },

    /// Response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Capability for fetching the entities intersecting a batch of tiles.
///
/// Implementations receive the zoom level, the newly visible tile keys, the
/// active filter settings, and the selected [`FetchMode`], and resolve to
/// the matching entities. All implementations must be `Send + Sync`; calls
/// may overlap, so per-call state must not be shared mutably.
pub trait TileFetcher: Send + Sync {
    /// Fetch the entities for a batch of tiles.
    fn fetch_tiles<'a>(
        &'a self,
        zoom: u8,
        tiles: &'a [TileKey],
        filters: &'a FilterSettings,
        mode: FetchMode,
    ) -> BoxFuture<'a, Result<Vec<Entity>, FetchError>>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Mock fetcher recording every call and replaying canned responses.
    ///
    /// Responses are consumed in order; once exhausted, further calls
    /// return an empty batch.
    pub struct MockTileFetcher {
        responses: Mutex<Vec<Result<Vec<Entity>, FetchError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    /// Arguments of one recorded `fetch_tiles` invocation.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub zoom: u8,
        pub tiles: Vec<TileKey>,
        pub filters: FilterSettings,
        pub mode: FetchMode,
    }

    impl MockTileFetcher {
        pub fn new(responses: Vec<Result<Vec<Entity>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// A fetcher that always resolves to an empty batch.
        pub fn empty() -> Self {
            Self::new(Vec::new())
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl TileFetcher for MockTileFetcher {
        fn fetch_tiles<'a>(
            &'a self,
            zoom: u8,
            tiles: &'a [TileKey],
            filters: &'a FilterSettings,
            mode: FetchMode,
        ) -> BoxFuture<'a, Result<Vec<Entity>, FetchError>> {
            self.calls.lock().push(RecordedCall {
                zoom,
                tiles: tiles.to_vec(),
                filters: *filters,
                mode,
            });

            let mut responses = self.responses.lock();
            let response = if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            };

            Box::pin(async move { response })
        }
    }

    #[test]
    fn test_mode_for_zoom_boundary() {
        // Threshold T: zoom T−1 is coarse, zoom T is fine
        assert_eq!(FetchMode::for_zoom(9, 10), FetchMode::Coarse);
        assert_eq!(FetchMode::for_zoom(10, 10), FetchMode::Fine);
        assert_eq!(FetchMode::for_zoom(18, 10), FetchMode::Fine);
        assert_eq!(FetchMode::for_zoom(0, 10), FetchMode::Coarse);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(FetchMode::Coarse.as_str(), "coarse");
        assert_eq!(FetchMode::Fine.to_string(), "fine");
    }

    #[tokio::test]
    async fn test_mock_replays_responses_in_order() {
        let fetcher = MockTileFetcher::new(vec![
            Ok(vec![Entity::new("A", 0.0, 0.0)]),
            Err(FetchError::Transport("boom".into())),
        ]);
        let tiles = [TileKey::new(9, 1, 1)];
        let filters = FilterSettings::default();

        let first = fetcher
            .fetch_tiles(9, &tiles, &filters, FetchMode::Coarse)
            .await;
        assert_eq!(first.unwrap().len(), 1);

        let second = fetcher
            .fetch_tiles(9, &tiles, &filters, FetchMode::Coarse)
            .await;
        assert!(second.is_err());

        let third = fetcher
            .fetch_tiles(9, &tiles, &filters, FetchMode::Coarse)
            .await;
        assert_eq!(third.unwrap().len(), 0, "exhausted mock yields empty");

        assert_eq!(fetcher.call_count(), 3);
    }
}
