//! Forwarding to the backend origin.

use std::time::Duration;

use thiserror::Error;

/// Request headers that are not forwarded.
const HOP_BY_HOP_REQUEST: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "accept-encoding",
    "keep-alive",
    "upgrade",
];

/// Response headers that are not copied back.
const HOP_BY_HOP_RESPONSE: &[&str] = &[
    "connection",
    "content-length",
    "transfer-encoding",
    "content-encoding",
    "keep-alive",
];

/// Errors reaching the backend.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The incoming request could not be translated.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },
}

/// A request to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// HTTP method, e.g. `"GET"`.
    pub method: String,
    /// Full backend URL including the query string.
    pub url: String,
    /// End-to-end request headers.
    pub headers: Vec<(String, String)>,
    /// Request body; empty for GET.
    pub body: Vec<u8>,
}

/// A backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Whether a request header is forwarded to the backend.
#[must_use]
pub fn forwards_request_header(name: &str) -> bool {
    !HOP_BY_HOP_REQUEST
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Whether a backend response header is copied to the client.
#[must_use]
pub fn copies_response_header(name: &str) -> bool {
    !HOP_BY_HOP_RESPONSE
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// The backend origin.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    /// Sends `request` to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] if the backend cannot be reached.
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// `reqwest`-backed [`Upstream`].
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Upstream for ReqwestUpstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            ProxyError::InvalidRequest {
                message: format!("unsupported method {}: {e}", request.method),
            }
        })?;

        log::debug!("{method} {}", request.url);
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter(|(name, _)| copies_response_header(name.as_str()))
            .filter_map(|(name, value)| {
                Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
            })
            .collect();
        let body = resp.bytes().await?.to_vec();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_hop_by_hop_headers() {
        assert!(!forwards_request_header("Host"));
        assert!(!forwards_request_header("accept-encoding"));
        assert!(forwards_request_header("Authorization"));
        assert!(forwards_request_header("content-type"));

        assert!(!copies_response_header("Transfer-Encoding"));
        assert!(copies_response_header("content-type"));
    }

    #[test]
    fn success_is_2xx() {
        let mut response = UpstreamResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 404;
        assert!(!response.is_success());
    }
}
