//! Tile URL template expansion.
//!
//! Recognised placeholders: `{z}`, `{x}`, `{y}`, `{prefix}`, `{quadkey}`,
//! `{bbox-epsg-3857}` and `{ratio}`.

use std::f64::consts::PI;

use super::types::{CanonicalTileId, Scheme};

/// WGS84 equatorial radius in metres, used for EPSG:3857 extents.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Reference tile size for EPSG:3857 bbox placeholders.
const BBOX_TILE_SIZE: f64 = 256.0;

impl CanonicalTileId {
    /// Expands a URL template for this tile.
    ///
    /// With several templates the one at `(x + y) % len` is used so that
    /// neighbouring tiles spread across hosts. Returns `None` when there are
    /// no templates to choose from.
    pub fn url(&self, templates: &[String], scheme: Scheme) -> Option<String> {
        self.url_with_ratio(templates, scheme, 1.0)
    }

    /// Expands a URL template with an explicit device pixel ratio.
    pub fn url_with_ratio(
        &self,
        templates: &[String],
        scheme: Scheme,
        pixel_ratio: f64,
    ) -> Option<String> {
        if templates.is_empty() {
            return None;
        }
        let index = ((u64::from(self.x) + u64::from(self.y)) % templates.len() as u64) as usize;
        let template = &templates[index];

        let y = match scheme {
            Scheme::Xyz => u64::from(self.y),
            Scheme::Tms => self.dim().saturating_sub(u64::from(self.y) + 1),
        };
        let prefix = format!("{:x}{:x}", self.x % 16, self.y % 16);
        let ratio = if pixel_ratio > 1.0 { "@2x" } else { "" };

        Some(
            template
                .replace("{prefix}", &prefix)
                .replace("{z}", &self.z.to_string())
                .replace("{x}", &self.x.to_string())
                .replace("{y}", &y.to_string())
                .replace("{ratio}", ratio)
                .replace("{quadkey}", &self.quadkey())
                .replace("{bbox-epsg-3857}", &self.bbox_epsg_3857()),
        )
    }

    /// Bing-style quadkey for this tile. Empty at zoom 0.
    pub fn quadkey(&self) -> String {
        (1..=self.z)
            .rev()
            .map(|z| {
                let bit = 1u32.checked_shl(u32::from(z - 1)).unwrap_or(0);
                let mut digit = 0u8;
                if self.x & bit != 0 {
                    digit += 1;
                }
                if self.y & bit != 0 {
                    digit += 2;
                }
                char::from(b'0' + digit)
            })
            .collect()
    }

    /// Tile extent in EPSG:3857 metres as `minx,miny,maxx,maxy`.
    pub fn bbox_epsg_3857(&self) -> String {
        let flipped_y = self.dim() as f64 - f64::from(self.y) - 1.0;
        let x = f64::from(self.x);
        let (min_x, min_y) = mercator_metres(x * BBOX_TILE_SIZE, flipped_y * BBOX_TILE_SIZE, self.z);
        let (max_x, max_y) = mercator_metres(
            (x + 1.0) * BBOX_TILE_SIZE,
            (flipped_y + 1.0) * BBOX_TILE_SIZE,
            self.z,
        );
        format!("{},{},{},{}", min_x, min_y, max_x, max_y)
    }
}

fn mercator_metres(px: f64, py: f64, z: u8) -> (f64, f64) {
    let circumference = 2.0 * PI * EARTH_RADIUS;
    let resolution = circumference / BBOX_TILE_SIZE / 2f64.powi(i32::from(z));
    let half = circumference / 2.0;
    (px * resolution - half, py * resolution - half)
}
