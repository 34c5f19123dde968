//! Source options and the resolved source configuration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bounds::LngLatBounds;
use crate::coord::Scheme;
use crate::index::IndexDocument;

/// Type tag of this source kind.
pub const SOURCE_TYPE: &str = "batched-model";

/// Default minimum zoom.
pub const DEFAULT_MIN_ZOOM: u8 = 0;

/// Default maximum zoom.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Logical tile size in pixels.
pub const TILE_SIZE: u32 = 512;

/// Caller-supplied source description.
///
/// Deserializes from the JSON shape used in style documents:
///
/// ```json
/// { "type": "batched-model", "tiles": ["https://example/{z}/{x}/{y}"], "maxzoom": 16 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

impl SourceOptions {
    /// Options pointing at a remote index document.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Options with literal tile templates.
    pub fn from_tiles<I, S>(tiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tiles: Some(tiles.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_zoom_range(mut self, minzoom: u8, maxzoom: u8) -> Self {
        self.minzoom = Some(minzoom);
        self.maxzoom = Some(maxzoom);
        self
    }

    pub fn with_bounds(mut self, bounds: [f64; 4]) -> Self {
        self.bounds = Some(bounds.to_vec());
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    /// The index-document fields these options carry.
    ///
    /// Used as the whole document when there is no `url`, and as overrides
    /// on top of a fetched document otherwise.
    pub fn to_document(&self) -> IndexDocument {
        IndexDocument {
            tiles: self.tiles.clone(),
            minzoom: self.minzoom,
            maxzoom: self.maxzoom,
            bounds: self.bounds.clone(),
            attribution: self.attribution.clone(),
            ..Default::default()
        }
    }
}

/// Resolved configuration of a source.
///
/// Built from [`SourceOptions`] and updated once by [`reconcile`](Self::reconcile)
/// when the index document arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub id: String,
    pub url: Option<String>,
    pub tiles: Vec<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_size: u32,
    pub scheme: Scheme,
    pub round_zoom: bool,
    pub reparse_overscaled: bool,
    pub bounds: Option<LngLatBounds>,
    pub attribution: Option<String>,
    pub name: Option<String>,
}

impl SourceConfig {
    /// Builds the initial configuration. Zero zooms fall back to the defaults.
    pub fn new(id: impl Into<String>, options: &SourceOptions) -> Self {
        Self {
            id: id.into(),
            url: options.url.clone(),
            tiles: options.tiles.clone().unwrap_or_default(),
            min_zoom: options.minzoom.unwrap_or(DEFAULT_MIN_ZOOM),
            max_zoom: options
                .maxzoom
                .filter(|z| *z > 0)
                .unwrap_or(DEFAULT_MAX_ZOOM),
            tile_size: TILE_SIZE,
            scheme: Scheme::Xyz,
            round_zoom: true,
            reparse_overscaled: true,
            bounds: None,
            attribution: options.attribution.clone(),
            name: None,
        }
    }

    /// Applies the overridable fields of an index document.
    ///
    /// Only `tiles`, `minzoom`, `maxzoom`, `bounds`, `attribution` and `name`
    /// are taken; absent fields leave the current value alone. Bounds are only
    /// taken while unset. Tile size, scheme and the zoom flags are fixed for
    /// this source kind.
    pub fn reconcile(&mut self, document: &IndexDocument) {
        if let Some(tiles) = document.tiles.as_ref().filter(|t| !t.is_empty()) {
            self.tiles = tiles.clone();
        }
        if let Some(min_zoom) = document.minzoom {
            self.min_zoom = min_zoom;
        }
        if let Some(max_zoom) = document.maxzoom {
            self.max_zoom = max_zoom;
        }
        if self.bounds.is_none() {
            if let Some(bounds) = document.bounds.as_deref() {
                self.bounds = Some(LngLatBounds::from_slice(bounds));
            }
        }
        if let Some(attribution) = &document.attribution {
            self.attribution = Some(attribution.clone());
        }
        if let Some(name) = &document.name {
            self.name = Some(name.clone());
        }
        debug!(
            source = %self.id,
            templates = self.tiles.len(),
            min_zoom = self.min_zoom,
            max_zoom = self.max_zoom,
            "Source configuration reconciled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::new("models", &SourceOptions::from_tiles(["https://t/{z}/{x}/{y}"]));
        assert_eq!(config.min_zoom, 0);
        assert_eq!(config.max_zoom, 19);
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.scheme, Scheme::Xyz);
        assert!(config.round_zoom);
        assert!(config.reparse_overscaled);
        assert!(config.bounds.is_none());
    }

    #[test]
    fn test_zero_maxzoom_uses_default() {
        let options = SourceOptions::default().with_zoom_range(2, 0);
        let config = SourceConfig::new("models", &options);
        assert_eq!(config.min_zoom, 2);
        assert_eq!(config.max_zoom, 19);
    }

    #[test]
    fn test_options_from_json() {
        let options = SourceOptions::from_json(
            r#"{"type":"batched-model","url":"https://example/tiles.json","maxzoom":14,"extra":1}"#,
        )
        .unwrap();
        assert_eq!(options.source_type.as_deref(), Some("batched-model"));
        assert_eq!(options.url.as_deref(), Some("https://example/tiles.json"));
        assert_eq!(options.maxzoom, Some(14));
        assert!(options.tiles.is_none());
    }

    #[test]
    fn test_reconcile_overrides_listed_fields() {
        let mut config = SourceConfig::new("models", &SourceOptions::from_url("https://x"));
        let document = IndexDocument {
            tiles: Some(vec!["https://t/{z}/{x}/{y}".to_string()]),
            minzoom: Some(3),
            maxzoom: Some(15),
            bounds: Some(vec![-10.0, -10.0, 10.0, 10.0]),
            name: Some("Buildings".to_string()),
            scheme: Some(Scheme::Tms),
            tile_size: Some(256),
            ..Default::default()
        };
        config.reconcile(&document);

        assert_eq!(config.tiles, vec!["https://t/{z}/{x}/{y}".to_string()]);
        assert_eq!((config.min_zoom, config.max_zoom), (3, 15));
        assert_eq!(config.name.as_deref(), Some("Buildings"));
        assert!(config.bounds.is_some());
        // Fixed for this source kind
        assert_eq!(config.scheme, Scheme::Xyz);
        assert_eq!(config.tile_size, 512);
    }

    #[test]
    fn test_reconcile_keeps_fields_absent_from_document() {
        let options = SourceOptions::from_tiles(["https://a/{z}/{x}/{y}"])
            .with_zoom_range(1, 12)
            .with_attribution("© Example");
        let mut config = SourceConfig::new("models", &options);
        config.reconcile(&IndexDocument {
            tiles: Some(Vec::new()),
            ..Default::default()
        });

        assert_eq!(config.tiles, vec!["https://a/{z}/{x}/{y}".to_string()]);
        assert_eq!((config.min_zoom, config.max_zoom), (1, 12));
        assert_eq!(config.attribution.as_deref(), Some("© Example"));
    }

    #[test]
    fn test_bounds_set_once() {
        let mut config = SourceConfig::new("models", &SourceOptions::default());
        config.reconcile(&IndexDocument {
            bounds: Some(vec![-10.0, -10.0, 10.0, 10.0]),
            ..Default::default()
        });
        let first = config.bounds;
        config.reconcile(&IndexDocument {
            bounds: Some(vec![0.0, 0.0, 1.0, 1.0]),
            ..Default::default()
        });
        assert_eq!(config.bounds, first);
    }

    #[test]
    fn test_options_to_document() {
        let options = SourceOptions::from_tiles(["https://a"]).with_bounds([0.0, 0.0, 1.0, 1.0]);
        let document = options.to_document();
        assert_eq!(document.tiles, Some(vec!["https://a".to_string()]));
        assert_eq!(document.bounds, Some(vec![0.0, 0.0, 1.0, 1.0]));
        assert!(document.name.is_none());
    }
}
