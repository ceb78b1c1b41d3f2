//! BridgeMap - viewport-driven loading for georeferenced bridge records
//!
//! This library implements the spatial tile cache and incremental fetch
//! coordination behind an interactive bridge inventory map: as the visible
//! viewport changes, only the map tiles not yet requested under the active
//! query filters are fetched, and results accumulate in a deduplicated
//! entity store for the rendering layer.
//!
//! # Architecture
//!
//! - [`coord`] - geographic to Web Mercator tile projection
//! - [`tile`] - tile grid identifiers
//! - [`viewport`] - viewport bounds and covering-tile enumeration
//! - [`filter`] - query filter settings that partition fetch caching
//! - [`cache`] - per-context set of already-requested tiles
//! - [`store`] - deduplicated, first-write-wins entity collection
//! - [`fetch`] - the injected fetch capability boundary and HTTP backend
//! - [`coordinator`] - orchestrates enumerate, diff, claim, fetch, merge
//! - [`notify`] - subscribe/unsubscribe viewport event plumbing

pub mod cache;
pub mod coord;
pub mod coordinator;
pub mod fetch;
pub mod filter;
pub mod notify;
pub mod store;
pub mod tile;
pub mod viewport;

pub use cache::FetchCache;
pub use coord::CoordError;
pub use coordinator::{CoordinatorConfig, FetchCoordinator, RetryPolicy, SettleOutcome};
pub use fetch::{FetchError, FetchMode, HttpTileFetcher, TileFetcher};
pub use filter::{FilterSettings, RankingKey};
pub use notify::{ViewportDriver, ViewportNotifier};
pub use store::{Entity, ResultStore};
pub use tile::TileKey;
pub use viewport::{GeoPoint, ViewportBounds, ViewportEvent};
