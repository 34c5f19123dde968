//! HTTP transport backed by reqwest.

use std::time::Duration;

use reqwest::header::{HeaderName, CACHE_CONTROL, EXPIRES};
use tracing::debug;

use super::{BoxFuture, HttpResponse, HttpTransport, TransportError};
use crate::request::RequestParameters;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Real HTTP transport implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransportError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(
        &'a self,
        request: &'a RequestParameters,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let url = request.url.as_str();
            let mut builder = self.client.get(url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder.send().await.map_err(|e| TransportError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let header = |name: HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let cache_control = header(CACHE_CONTROL);
            let expires = header(EXPIRES);

            let body = response.bytes().await.map_err(|e| TransportError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            debug!(url, bytes = body.len(), kind = %request.kind, "Fetched resource");

            Ok(HttpResponse {
                body,
                cache_control,
                expires,
            })
        })
    }
}
