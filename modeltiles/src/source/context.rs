//! Map-level settings a source reads when loading.

use std::fmt;
use std::sync::Arc;

use crate::request::{DefaultRequestManager, RequestManager};

/// The parts of the owning map a source depends on.
#[derive(Clone)]
pub struct MapContext {
    /// Request transform collaborator.
    pub requests: Arc<dyn RequestManager>,
    /// Preferred languages, most preferred first.
    pub language: Option<Vec<String>>,
    /// ISO 3166 alpha-2 worldview.
    pub worldview: Option<String>,
    /// Track `Cache-Control`/`Expires` on loaded tiles.
    pub refresh_expired_tiles: bool,
    /// Renderer debug flag forwarded to workers.
    pub show_collision_boxes: bool,
}

impl MapContext {
    pub fn new(requests: Arc<dyn RequestManager>) -> Self {
        Self {
            requests,
            language: None,
            worldview: None,
            refresh_expired_tiles: true,
            show_collision_boxes: false,
        }
    }

    pub fn with_language<I, S>(mut self, language: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let language: Vec<String> = language.into_iter().map(Into::into).collect();
        self.language = (!language.is_empty()).then_some(language);
        self
    }

    pub fn with_worldview(mut self, worldview: impl Into<String>) -> Self {
        self.worldview = Some(worldview.into());
        self
    }

    pub fn with_refresh_expired_tiles(mut self, enabled: bool) -> Self {
        self.refresh_expired_tiles = enabled;
        self
    }

    pub fn with_show_collision_boxes(mut self, enabled: bool) -> Self {
        self.show_collision_boxes = enabled;
        self
    }

    /// Language hint as sent to the server: a comma-joined list.
    pub fn language_param(&self) -> Option<String> {
        self.language.as_ref().map(|l| l.join(","))
    }
}

impl Default for MapContext {
    fn default() -> Self {
        Self::new(Arc::new(DefaultRequestManager::new()))
    }
}

impl fmt::Debug for MapContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapContext")
            .field("language", &self.language)
            .field("worldview", &self.worldview)
            .field("refresh_expired_tiles", &self.refresh_expired_tiles)
            .field("show_collision_boxes", &self.show_collision_boxes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_param_joins() {
        let context = MapContext::default().with_language(["en", "fr"]);
        assert_eq!(context.language_param().as_deref(), Some("en,fr"));
        assert_eq!(MapContext::default().language_param(), None);
    }

    #[test]
    fn test_empty_language_is_none() {
        let context = MapContext::default().with_language(Vec::<String>::new());
        assert!(context.language.is_none());
    }
}
