//! Tile identifiers for the Web Mercator grid.
//!
//! A [`TileKey`] names one cell of the power-of-two subdivision of the
//! projected map plane at a given zoom level. Keys are the unit of fetch
//! caching: the coordinator tracks which keys have already been requested
//! per filter context.

use std::fmt;

/// Identifier of one tile in the power-of-two grid at a given zoom level.
///
/// At zoom `z` the world is divided into `2^z × 2^z` tiles, with `x`
/// increasing eastward from −180° longitude and `y` increasing southward
/// from the top of the Mercator plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Zoom level of the grid this key belongs to.
    pub zoom: u8,
    /// Column index, west to east.
    pub x: u32,
    /// Row index, north to south (Mercator orientation).
    pub y: u32,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl fmt::Display for TileKey {
    /// Renders the `"{zoom}_{x}_{y}"` cache-key form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.zoom, self.x, self.y)
    }
}
