//! Network transport abstraction.
//!
//! The [`HttpTransport`] trait performs a single GET exchange for a
//! transformed request. Both the index bootstrapper and the tile workers go
//! through it, which keeps the whole loading pipeline testable with mock
//! transports.
//!
//! # Dyn Compatibility
//!
//! Async methods return [`BoxFuture`] so that transports can be shared as
//! `Arc<dyn HttpTransport>`.

mod http;

pub use http::{ReqwestTransport, DEFAULT_TIMEOUT_SECS};

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use thiserror::Error;

use crate::request::RequestParameters;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Response of a successful exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response body.
    pub body: Bytes,
    /// `Cache-Control` header, if any.
    pub cache_control: Option<String>,
    /// `Expires` header, if any.
    pub expires: Option<String>,
}

impl HttpResponse {
    /// Creates a response with only a body.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            cache_control: None,
            expires: None,
        }
    }

    /// Sets the `Cache-Control` header.
    pub fn with_cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Sets the `Expires` header.
    pub fn with_expires(mut self, value: impl Into<String>) -> Self {
        self.expires = Some(value.into());
        self
    }
}

/// Errors raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request could not be sent or timed out.
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The response body could not be read.
    #[error("Failed to read response from {url}: {reason}")]
    Body { url: String, reason: String },

    /// The transport could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Performs network exchanges.
pub trait HttpTransport: Send + Sync {
    /// Performs a GET for the request.
    fn get<'a>(
        &'a self,
        request: &'a RequestParameters,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Mock transport answering from a URL-keyed table.
    ///
    /// Unknown URLs answer with a 404.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<RequestParameters>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url: &str, response: Result<HttpResponse, TransportError>) {
            self.responses.lock().insert(url.to_string(), response);
        }

        pub fn requests(&self) -> Vec<RequestParameters> {
            self.requests.lock().clone()
        }
    }

    impl HttpTransport for MockTransport {
        fn get<'a>(
            &'a self,
            request: &'a RequestParameters,
        ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
            Box::pin(async move {
                self.requests.lock().push(request.clone());
                self.responses
                    .lock()
                    .get(&request.url)
                    .cloned()
                    .unwrap_or_else(|| {
                        Err(TransportError::Status {
                            status: 404,
                            url: request.url.clone(),
                        })
                    })
            })
        }
    }

    #[tokio::test]
    async fn test_mock_transport_success() {
        let mock = MockTransport::new();
        mock.respond("http://example.com", Ok(HttpResponse::new(vec![1, 2, 3])));

        let request = RequestParameters::new("http://example.com", crate::request::ResourceKind::Tile);
        let response = mock.get(&request).await.unwrap();
        assert_eq!(response.body.as_ref(), &[1, 2, 3]);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_url() {
        let mock = MockTransport::new();
        let request = RequestParameters::new("http://missing", crate::request::ResourceKind::Tile);
        let result = mock.get(&request).await;
        assert!(matches!(result, Err(TransportError::Status { status: 404, .. })));
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Status {
            status: 503,
            url: "https://example.com/a".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com/a");
    }
}
