//! Viewport types and tile enumeration.
//!
//! The map front end reports the visible bounding rectangle whenever panning
//! or zooming settles. [`tiles_in_viewport`] converts that rectangle into the
//! set of tile keys covering it, the input to fetch-cache diffing.

use crate::coord::{self, CoordError};
use crate::tile::TileKey;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The currently visible geographic bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    /// Southwest corner of the viewport.
    pub south_west: GeoPoint,
    /// Northeast corner of the viewport.
    pub north_east: GeoPoint,
}

impl ViewportBounds {
    /// Create bounds from southwest and northeast corners.
    pub fn new(south_west: GeoPoint, north_east: GeoPoint) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Create bounds from edge coordinates (south, west, north, east).
    pub fn from_edges(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south_west: GeoPoint::new(south, west),
            north_east: GeoPoint::new(north, east),
        }
    }
}

/// A settled viewport change: the visible bounds and the zoom they were
/// observed at. Delivered by the viewport notifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEvent {
    /// The visible bounding rectangle.
    pub bounds: ViewportBounds,
    /// Map zoom level at settle time.
    pub zoom: u8,
}

/// Enumerates every tile key covering the viewport at the given zoom.
///
/// Both corners are projected independently and the inclusive min..=max
/// range is walked on both axes. The min/max guard matters on the y axis:
/// Mercator y increases southward while latitude increases northward, so
/// naive corner ordering would invert the range. Keys are unique by
/// construction; no ordering is guaranteed.
///
/// # Errors
///
/// Returns `CoordError` if either corner falls outside the projectable
/// range (see [`crate::coord::to_tile_key`]).
pub fn tiles_in_viewport(bounds: &ViewportBounds, zoom: u8) -> Result<Vec<TileKey>, CoordError> {
    let sw = coord::to_tile_key(bounds.south_west.lat, bounds.south_west.lon, zoom)?;
    let ne = coord::to_tile_key(bounds.north_east.lat, bounds.north_east.lon, zoom)?;

    let (x_min, x_max) = (sw.x.min(ne.x), sw.x.max(ne.x));
    let (y_min, y_max) = (sw.y.min(ne.y), sw.y.max(ne.y));

    let capacity = (x_max - x_min + 1) as usize * (y_max - y_min + 1) as usize;
    let mut keys = Vec::with_capacity(capacity);
    for x in x_min..=x_max {
        for y in y_min..=y_max {
            keys.push(TileKey::new(zoom, x, y));
        }
    }

    Ok(keys)
}
