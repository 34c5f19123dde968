//! Tile coordinate module
//!
//! Provides tile identities (canonical and overscaled), URL template
//! expansion and the Web Mercator conversions used to place tiles on the
//! globe.

mod types;
mod url;

pub use types::{
    CanonicalTileId, CoordError, OverscaledTileId, Scheme, MAX_OVERSCALED_ZOOM, MAX_ZOOM,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.051129;
pub const MAX_LAT: f64 = 85.051129;

/// Converts a longitude to a normalized mercator x in `[0, 1]`.
#[inline]
pub fn mercator_x_from_lng(lng: f64) -> f64 {
    (180.0 + lng) / 360.0
}

/// Converts a latitude to a normalized mercator y in `[0, 1]`, 0 at the north edge.
///
/// Latitudes beyond the mercator limits are clamped first.
#[inline]
pub fn mercator_y_from_lat(lat: f64) -> f64 {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    (180.0 - (180.0 / PI) * (PI / 4.0 + lat * PI / 360.0).tan().ln()) / 360.0
}

/// Returns the longitude/latitude of a tile's northwest corner.
#[inline]
pub fn tile_to_lng_lat(tile: &CanonicalTileId) -> (f64, f64) {
    let n = tile.dim() as f64;
    let lng = f64::from(tile.x) / n * 360.0 - 180.0;
    let y = f64::from(tile.y) / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
    (lng, lat)
}
