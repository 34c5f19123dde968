//! Geographic bounds filtering for tile requests.
//!
//! A [`TileBounds`] answers whether a tile is in scope for a source: it must
//! sit inside the source's zoom range and its extent must intersect the
//! configured longitude/latitude rectangle. Both checks are pure.

use crate::coord::{mercator_x_from_lng, mercator_y_from_lat, CanonicalTileId};

/// Longitude/latitude rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLatBounds {
    /// Western longitude
    pub west: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
    /// Northern latitude
    pub north: f64,
}

impl LngLatBounds {
    /// The whole world.
    pub const WORLD: LngLatBounds = LngLatBounds {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    /// Builds bounds from a `[west, south, east, north]` slice.
    ///
    /// Anything other than four values falls back to the whole world; values
    /// are clamped to the valid longitude/latitude ranges.
    pub fn from_slice(bounds: &[f64]) -> Self {
        match bounds {
            [west, south, east, north] => Self {
                west: west.max(-180.0),
                south: south.max(-90.0),
                east: east.min(180.0),
                north: north.min(90.0),
            },
            _ => Self::WORLD,
        }
    }

    /// Returns the bounds as `[west, south, east, north]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Bounds filter for a tile source.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBounds {
    bounds: LngLatBounds,
    min_zoom: u8,
    max_zoom: u8,
}

impl TileBounds {
    /// Creates a filter from raw `[west, south, east, north]` bounds and a zoom range.
    pub fn new(bounds: &[f64], min_zoom: u8, max_zoom: u8) -> Self {
        Self {
            bounds: LngLatBounds::from_slice(bounds),
            min_zoom,
            max_zoom,
        }
    }

    /// The validated bounds.
    pub fn bounds(&self) -> LngLatBounds {
        self.bounds
    }

    /// Zoom range as `(min, max)`.
    pub fn zoom_range(&self) -> (u8, u8) {
        (self.min_zoom, self.max_zoom)
    }

    /// Returns true if the tile is inside the zoom range and intersects the bounds.
    pub fn contains(&self, tile: &CanonicalTileId) -> bool {
        self.contains_zoom(tile.z) && self.intersects(tile)
    }

    /// Returns true if `z` lies in `[min_zoom, max_zoom]`.
    #[inline]
    pub fn contains_zoom(&self, z: u8) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&z)
    }

    /// Returns true if the tile's extent intersects the bounds at its zoom.
    pub fn intersects(&self, tile: &CanonicalTileId) -> bool {
        let world_size = tile.dim() as f64;
        let min_x = (mercator_x_from_lng(self.bounds.west) * world_size).floor();
        let min_y = (mercator_y_from_lat(self.bounds.north) * world_size).floor();
        let max_x = (mercator_x_from_lng(self.bounds.east) * world_size).ceil();
        let max_y = (mercator_y_from_lat(self.bounds.south) * world_size).ceil();

        let x = f64::from(tile.x);
        let y = f64::from(tile.y);
        x >= min_x && x < max_x && y >= min_y && y < max_y
    }
}
