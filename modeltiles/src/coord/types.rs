//! Tile identity type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest canonical zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Highest canonical zoom level a tile index may address.
pub const MAX_ZOOM: u8 = 25;

/// Highest zoom a tile may be overscaled to.
pub const MAX_OVERSCALED_ZOOM: u8 = 31;

/// Tile addressing scheme for the `{y}` template placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Slippy-map rows, 0 at the north edge.
    #[default]
    Xyz,
    /// TMS rows, 0 at the south edge.
    Tms,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Xyz => write!(f, "xyz"),
            Scheme::Tms => write!(f, "tms"),
        }
    }
}

/// Canonical tile address in the Web Mercator grid.
///
/// `x` grows eastward and `y` southward; both are bounded by `2^z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalTileId {
    /// Zoom level
    pub z: u8,
    /// Column, 0 at the antimeridian west edge
    pub x: u32,
    /// Row, 0 at the north edge
    pub y: u32,
}

impl CanonicalTileId {
    /// Creates a canonical tile id, validating the zoom and grid position.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z));
        }
        let dim = 1u64 << z;
        if u64::from(x) >= dim || u64::from(y) >= dim {
            return Err(CoordError::OutOfGrid { z, x, y });
        }
        Ok(Self { z, x, y })
    }

    /// Number of tiles along one axis at this zoom.
    ///
    /// Saturates at `u64::MAX` for zooms a struct literal may carry past 63.
    #[inline]
    pub fn dim(&self) -> u64 {
        1u64.checked_shl(u32::from(self.z)).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for CanonicalTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Tile identity as seen by the renderer.
///
/// Wraps a canonical address with the world copy (`wrap`) it is drawn in and
/// the zoom it is rendered at. When `overscaled_z > canonical.z` the tile is
/// drawn past the zoom it was authored for and requests are sized up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverscaledTileId {
    /// Zoom the tile is rendered at.
    pub overscaled_z: u8,
    /// World copy index, 0 for the primary world.
    pub wrap: i32,
    /// Canonical address of the content.
    pub canonical: CanonicalTileId,
}

impl OverscaledTileId {
    /// Creates an overscaled tile id.
    pub fn new(overscaled_z: u8, wrap: i32, z: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        let canonical = CanonicalTileId::new(z, x, y)?;
        if overscaled_z < z || overscaled_z > MAX_OVERSCALED_ZOOM {
            return Err(CoordError::InvalidOverscale {
                overscaled_z,
                canonical_z: z,
            });
        }
        Ok(Self {
            overscaled_z,
            wrap,
            canonical,
        })
    }

    /// Identity for a tile rendered at its own zoom in the primary world.
    pub fn from_canonical(canonical: CanonicalTileId) -> Self {
        Self {
            overscaled_z: canonical.z,
            wrap: 0,
            canonical,
        }
    }

    /// Multiplier applied to the tile pixel size when overscaled.
    ///
    /// An id rendered below its canonical zoom counts as not overscaled; the
    /// factor saturates at `u32::MAX`.
    #[inline]
    pub fn overscale_factor(&self) -> u32 {
        match self.overscaled_z.checked_sub(self.canonical.z) {
            Some(delta) => 1u32.checked_shl(u32::from(delta)).unwrap_or(u32::MAX),
            None => 1,
        }
    }
}

impl fmt::Display for OverscaledTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)?;
        if self.overscaled_z != self.canonical.z {
            write!(f, "@{}", self.overscaled_z)?;
        }
        if self.wrap != 0 {
            write!(f, "~{}", self.wrap)?;
        }
        Ok(())
    }
}

/// Errors that can occur when building tile identities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Zoom beyond the supported range.
    #[error("Invalid zoom level: {0} (must be {MIN_ZOOM}-{MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Column or row outside the `2^z` grid.
    #[error("Tile {z}/{x}/{y} is outside the zoom {z} grid")]
    OutOfGrid { z: u8, x: u32, y: u32 },

    /// Render zoom below the canonical zoom or past the overscale limit.
    #[error("Invalid overscaled zoom {overscaled_z} for canonical zoom {canonical_z}")]
    InvalidOverscale { overscaled_z: u8, canonical_z: u8 },

    /// A `z/x/y` string that could not be parsed.
    #[error("Invalid tile address '{0}' (expected z/x/y)")]
    InvalidAddress(String),
}

impl std::str::FromStr for CanonicalTileId {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidAddress(s.to_string());
        let mut parts = s.trim().split('/');
        let z = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let x = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let y = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Self::new(z, x, y)
    }
}
