//! Request transformation for source and tile URLs.
//!
//! The [`RequestManager`] trait is the narrow seam through which the map
//! rewrites URLs before they hit the network: adding localisation hints,
//! access tokens, or arbitrary caller-defined headers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use reqwest::Url;

/// Kind of resource a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Tile index document (TileJSON-like).
    Source,
    /// Individual tile payload.
    Tile,
    /// Anything else.
    Unknown,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Source => write!(f, "Source"),
            ResourceKind::Tile => write!(f, "Tile"),
            ResourceKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A transformed request ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    /// Final URL to fetch.
    pub url: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Resource kind the request was built for.
    pub kind: ResourceKind,
    /// Whether the fetcher should report resource timing.
    pub collect_resource_timing: bool,
}

impl RequestParameters {
    /// Creates a plain request for `url`.
    pub fn new(url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            kind,
            collect_resource_timing: false,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Rewrites URLs before they are fetched.
///
/// Implementations are pure and synchronous. There is no failure contract:
/// an unusable result surfaces later as a transport failure.
pub trait RequestManager: Send + Sync {
    /// Normalizes an index document URL, attaching locale hints.
    fn normalize_source_url(
        &self,
        url: &str,
        language: Option<&str>,
        worldview: Option<&str>,
    ) -> String;

    /// Normalizes an expanded tile URL.
    fn normalize_tile_url(&self, url: &str) -> String;

    /// Builds the request descriptor for a normalized URL.
    fn transform_request(&self, url: &str, kind: ResourceKind) -> RequestParameters;

    /// Canonicalizes the tile templates of a fetched index document.
    fn canonicalize_tileset(&self, tiles: &[String], _source_url: Option<&str>) -> Vec<String> {
        tiles.to_vec()
    }
}

/// Caller-supplied request rewrite hook.
///
/// Returning `None` keeps the default request.
pub type TransformFn = dyn Fn(&str, ResourceKind) -> Option<RequestParameters> + Send + Sync;

/// Default request manager.
///
/// Adds `language`/`worldview` query parameters to source URLs and an
/// optional `access_token` to every URL that lacks one.
#[derive(Clone, Default)]
pub struct DefaultRequestManager {
    access_token: Option<String>,
    collect_resource_timing: bool,
    transform: Option<Arc<TransformFn>>,
}

impl DefaultRequestManager {
    /// Creates a request manager with no token and no transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `access_token=<token>` to requests.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    /// Asks tile fetchers to report resource timing.
    pub fn with_resource_timing(mut self, enabled: bool) -> Self {
        self.collect_resource_timing = enabled;
        self
    }

    /// Installs a request rewrite hook.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str, ResourceKind) -> Option<RequestParameters> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    fn append_query(&self, url: &str, params: &[(&str, &str)]) -> String {
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };
        let present: Vec<String> = parsed.query_pairs().map(|(k, _)| k.into_owned()).collect();
        let missing: Vec<&(&str, &str)> = params
            .iter()
            .filter(|(k, _)| !present.iter().any(|p| p == k))
            .collect();
        if missing.is_empty() {
            return url.to_string();
        }
        {
            let mut pairs = parsed.query_pairs_mut();
            for (k, v) in missing {
                pairs.append_pair(k, v);
            }
        }
        parsed.to_string()
    }
}

impl fmt::Debug for DefaultRequestManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRequestManager")
            .field("has_access_token", &self.access_token.is_some())
            .field("collect_resource_timing", &self.collect_resource_timing)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

impl RequestManager for DefaultRequestManager {
    fn normalize_source_url(
        &self,
        url: &str,
        language: Option<&str>,
        worldview: Option<&str>,
    ) -> String {
        let mut params = Vec::new();
        if let Some(language) = language.filter(|l| !l.is_empty()) {
            params.push(("language", language));
        }
        if let Some(worldview) = worldview.filter(|w| !w.is_empty()) {
            params.push(("worldview", worldview));
        }
        if let Some(token) = self.access_token.as_deref() {
            params.push(("access_token", token));
        }
        self.append_query(url, &params)
    }

    fn normalize_tile_url(&self, url: &str) -> String {
        match self.access_token.as_deref() {
            Some(token) => self.append_query(url, &[("access_token", token)]),
            None => url.to_string(),
        }
    }

    fn transform_request(&self, url: &str, kind: ResourceKind) -> RequestParameters {
        let mut request = self
            .transform
            .as_ref()
            .and_then(|transform| transform(url, kind))
            .unwrap_or_else(|| RequestParameters::new(url, kind));
        if kind == ResourceKind::Tile && self.collect_resource_timing {
            request.collect_resource_timing = true;
        }
        request
    }
}
