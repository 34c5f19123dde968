//! Index fetch errors.

use thiserror::Error;

use crate::transport::TransportError;

/// Why an index bootstrap failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    /// The options name neither an index URL nor tile templates.
    #[error("Source must have either a url or a non-empty tiles list")]
    MissingSource,

    /// The index document could not be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The index document is not valid JSON of the expected shape.
    #[error("Failed to parse index document from {url}: {reason}")]
    Parse { url: String, reason: String },

    /// A load was requested before the source was added to a map.
    #[error("Source is not attached to a map")]
    Detached,

    /// The bootstrap task ended without producing a result.
    #[error("Index request ended without a result")]
    Interrupted,
}

/// A failed index bootstrap, with advisory diagnostics attached.
///
/// Diagnostics never change control flow; they hint at likely causes such
/// as a malformed language or worldview hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct FetchError {
    kind: FetchErrorKind,
    diagnostics: Vec<String>,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind) -> Self {
        Self {
            kind,
            diagnostics: Vec::new(),
        }
    }

    pub fn kind(&self) -> &FetchErrorKind {
        &self.kind
    }

    /// Advisory diagnostics collected by the caller.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Attaches an advisory diagnostic.
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostics.push(diagnostic.into());
        self
    }
}

impl From<FetchErrorKind> for FetchError {
    fn from(kind: FetchErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        Self::new(FetchErrorKind::Transport(err))
    }
}
