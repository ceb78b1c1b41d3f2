//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, the grid used for viewport-driven
//! fetch caching.
//!
//! Inputs are validated at this boundary: latitudes beyond the Web Mercator
//! range would drive the projection's `tan`/`sec` terms toward infinity and
//! yield non-finite tile indices, so they are rejected with
//! [`CoordError::InvalidLatitude`] instead of being silently clamped.

use std::f64::consts::PI;

use thiserror::Error;

use crate::tile::TileKey;

/// Minimum latitude representable in Web Mercator (degrees).
pub const MIN_LAT: f64 = -85.05112878;

/// Maximum latitude representable in Web Mercator (degrees).
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum longitude (degrees).
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// Maximum supported zoom level.
pub const MAX_ZOOM: u8 = 18;

/// Errors produced when geographic inputs fall outside the projectable range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range (±85.05112878°).
    #[error("latitude {0} outside Web Mercator range [{MIN_LAT}, {MAX_LAT}]")]
    InvalidLatitude(f64),

    /// Longitude outside [−180°, 180°].
    #[error("longitude {0} outside range [{MIN_LON}, {MAX_LON}]")]
    InvalidLongitude(f64),

    /// Zoom level above the supported maximum.
    #[error("zoom {0} exceeds maximum {MAX_ZOOM}")]
    InvalidZoom(u8),
}

/// Converts geographic coordinates to the containing tile key.
///
/// Uses the standard power-of-two Web Mercator scheme:
/// `x = floor((lon + 180) / 360 · 2^zoom)` and
/// `y = floor((1 − asinh(tan(lat·π/180))/π) / 2 · 2^zoom)`.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (−85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (−180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 18)
///
/// # Returns
///
/// The tile key containing the point, or a `CoordError` if any input is
/// out of range. Indices are clamped to `2^zoom − 1` so the inclusive
/// boundary values (lon = 180, lat = −85.05112878) stay on the grid.
#[inline]
pub fn to_tile_key(lat: f64, lon: f64, zoom: u8) -> Result<TileKey, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (1u32 << zoom) - 1;

    let x = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);

    // asinh(tan θ) is the ln(tan θ + sec θ) Mercator term
    let lat_rad = lat * PI / 180.0;
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(max_index);

    Ok(TileKey { zoom, x, y })
}

/// Converts a tile key back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileKey) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Computes the geographic bounding box of a tile.
///
/// Returns `(lat_min, lat_max, lon_min, lon_max)`, i.e. south, north, west,
/// east edges. Useful for fetch capabilities that translate tile keys into
/// spatial envelope queries.
#[inline]
pub fn tile_bounds(tile: &TileKey) -> (f64, f64, f64, f64) {
    let (lat_max, lon_min) = tile_to_lat_lon(tile);
    let south_east = TileKey::new(tile.zoom, tile.x + 1, tile.y + 1);
    let (lat_min, lon_max) = tile_to_lat_lon(&south_east);

    (lat_min, lat_max, lon_min, lon_max)
}
