//! Remote index document (TileJSON-like).

use serde::{Deserialize, Serialize};

use crate::coord::Scheme;

/// Recognized fields of an index document. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexDocument {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(rename = "tileSize", skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<u32>,
}

impl IndexDocument {
    /// Parses a document from a JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Returns true if the document lists at least one tile template.
    pub fn has_tiles(&self) -> bool {
        self.tiles.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Lays `overrides` over this document; fields present there win.
    pub fn overlay(mut self, overrides: IndexDocument) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if overrides.$field.is_some() { self.$field = overrides.$field; })*
            };
        }
        take!(tiles, minzoom, maxzoom, bounds, attribution, name, scheme, tile_size);
        self
    }
}
