//! Index bootstrap: fetches the index document for a source.
//!
//! Each [`IndexBootstrapper::begin`] performs at most one exchange and
//! settles at most once. Starting a new bootstrap cancels the previous one,
//! so a late result from a superseded request is never delivered.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::document::IndexDocument;
use super::error::{FetchError, FetchErrorKind};
use crate::request::{RequestManager, RequestParameters, ResourceKind};
use crate::source::SourceOptions;
use crate::transport::HttpTransport;

/// Cancels delivery of an outstanding index request.
///
/// Cancellation suppresses delivery only; an exchange already on the wire
/// may still complete.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// An outstanding index request.
#[derive(Debug)]
pub struct IndexRequest {
    cancel: CancelHandle,
    rx: oneshot::Receiver<Result<IndexDocument, FetchError>>,
}

impl IndexRequest {
    /// Handle that cancels this request.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Waits for the request to settle.
    ///
    /// Returns `None` if the request was cancelled or superseded.
    pub async fn settled(self) -> Option<Result<IndexDocument, FetchError>> {
        let Self { cancel, rx } = self;
        let received = tokio::select! {
            biased;
            _ = cancel.token.cancelled() => return None,
            received = rx => received,
        };
        if cancel.is_cancelled() {
            return None;
        }
        match received {
            Ok(result) => Some(result),
            Err(_) => Some(Err(FetchErrorKind::Interrupted.into())),
        }
    }
}

/// Starts index bootstraps for one source.
pub struct IndexBootstrapper {
    transport: Arc<dyn HttpTransport>,
    current: Mutex<Option<CancellationToken>>,
}

impl IndexBootstrapper {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            current: Mutex::new(None),
        }
    }

    /// Starts fetching the index document described by `options`.
    ///
    /// With a `url` the document is fetched and the option fields are laid
    /// over it. Without one, the options themselves form the document; it is
    /// still delivered asynchronously. Must be called inside a tokio runtime.
    pub fn begin(
        &self,
        options: &SourceOptions,
        requests: Arc<dyn RequestManager>,
        language: Option<&str>,
        worldview: Option<&str>,
    ) -> IndexRequest {
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }

        let (tx, rx) = oneshot::channel();
        let overrides = options.to_document();
        let request = options.url.as_deref().map(|url| {
            let url = requests.normalize_source_url(url, language, worldview);
            requests.transform_request(&url, ResourceKind::Source)
        });
        let transport = Arc::clone(&self.transport);
        let task_token = token.clone();

        tokio::spawn(async move {
            let work = async {
                match request {
                    Some(request) => {
                        fetch_document(transport.as_ref(), &request)
                            .await
                            .map(|fetched| {
                                let mut document = fetched.overlay(overrides);
                                if let Some(tiles) = document.tiles.as_deref() {
                                    document.tiles = Some(
                                        requests.canonicalize_tileset(tiles, Some(&request.url)),
                                    );
                                }
                                document
                            })
                    }
                    None => {
                        tokio::task::yield_now().await;
                        if overrides.has_tiles() {
                            Ok(overrides)
                        } else {
                            Err(FetchErrorKind::MissingSource.into())
                        }
                    }
                }
            };

            let result = tokio::select! {
                biased;
                _ = task_token.cancelled() => return,
                result = work => result,
            };
            if !task_token.is_cancelled() {
                let _ = tx.send(result);
            }
        });

        IndexRequest {
            cancel: CancelHandle::new(token),
            rx,
        }
    }

    /// Cancels the outstanding bootstrap, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }
}

impl std::fmt::Debug for IndexBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBootstrapper")
            .field("outstanding", &self.current.lock().is_some())
            .finish()
    }
}

#[instrument(level = "debug", skip(transport, request), fields(url = %request.url))]
async fn fetch_document(
    transport: &dyn HttpTransport,
    request: &RequestParameters,
) -> Result<IndexDocument, FetchError> {
    let response = transport.get(request).await?;
    let document = IndexDocument::from_slice(&response.body).map_err(|e| {
        FetchError::new(FetchErrorKind::Parse {
            url: request.url.clone(),
            reason: e.to_string(),
        })
    })?;
    debug!(
        templates = document.tiles.as_ref().map_or(0, Vec::len),
        "Index document fetched"
    );
    Ok(document)
}
