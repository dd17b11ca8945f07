#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the mapd development-permit backend.
//!
//! All requests go through the edge proxy (`/api/*`). The [`PermitBackend`]
//! trait is the seam the map state layer consumes; [`ApiClient`] is the
//! `reqwest` implementation. No request is retried: a failure is terminal
//! for that attempt and the caller decides how to degrade.

use std::time::Duration;

use mapd_permit_models::{
    AmenitiesResponse, HypotheticalRequest, HypotheticalResponse, ImpactReportResponse,
    LocationQuery, PermitsResponse,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default API base URL (the edge proxy).
pub const DEFAULT_API_URL: &str = "https://throbbing-rain-c8ee.email4leit.workers.dev/api";

/// Environment variable overriding [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "MAPD_API_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const API_TIMEOUT_ENV: &str = "MAPD_API_TIMEOUT_SECS";

/// Hypothetical reports run an LLM on the backend, so the default timeout
/// is generous.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 500;

/// Errors from backend API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Reads the configuration from [`API_URL_ENV`] and
    /// [`API_TIMEOUT_ENV`], falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = std::env::var(API_TIMEOUT_ENV)
            .ok()
            .and_then(|secs| secs.parse().ok())
            .map_or(defaults.timeout, Duration::from_secs);

        Self { base_url, timeout }
    }
}

/// The backend operations the map consumes.
#[async_trait::async_trait]
pub trait PermitBackend: Send + Sync {
    /// `GET /development-permits`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn development_permits(&self, query: LocationQuery)
    -> Result<PermitsResponse, ApiError>;

    /// `GET /amenities`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn amenities(&self, query: LocationQuery) -> Result<AmenitiesResponse, ApiError>;

    /// `GET /impact_reports/{permit_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn impact_report(&self, permit_id: &str) -> Result<ImpactReportResponse, ApiError>;

    /// `POST /hypothetical-impact-report`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request or decoding fails.
    async fn hypothetical_impact_report(
        &self,
        request: &HypotheticalRequest,
    ) -> Result<HypotheticalResponse, ApiError>;
}

/// `reqwest`-backed [`PermitBackend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is invalid, or
    /// [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ApiError::Config {
            message: format!("invalid API base URL {}: {e}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config {
                message: format!("{} cannot be used as a base URL", config.base_url),
            });
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Builds a client from [`ApiConfig::from_env`].
    ///
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&ApiConfig::from_env())
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL cannot take path
    /// segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Config {
                message: format!("{} cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: Option<&LocationQuery>,
    ) -> Result<T, ApiError> {
        log::debug!("GET {url} {query:?}");
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode(status, &body)
    }
}

#[async_trait::async_trait]
impl PermitBackend for ApiClient {
    async fn development_permits(
        &self,
        query: LocationQuery,
    ) -> Result<PermitsResponse, ApiError> {
        let url = self.endpoint(&["development-permits"])?;
        let response: PermitsResponse = self.get_json(url, Some(&query)).await?;
        log::info!("Fetched {} development permits", response.permits.len());
        Ok(response)
    }

    async fn amenities(&self, query: LocationQuery) -> Result<AmenitiesResponse, ApiError> {
        let url = self.endpoint(&["amenities"])?;
        self.get_json(url, Some(&query)).await
    }

    async fn impact_report(&self, permit_id: &str) -> Result<ImpactReportResponse, ApiError> {
        let url = self.endpoint(&["impact_reports", permit_id])?;
        self.get_json(url, None).await
    }

    async fn hypothetical_impact_report(
        &self,
        request: &HypotheticalRequest,
    ) -> Result<HypotheticalResponse, ApiError> {
        let url = self.endpoint(&["hypothetical-impact-report"])?;
        log::debug!("POST {url}");
        let resp = self.client.post(url).json(request).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode(status, &body)
    }
}

/// Decodes a response body, mapping non-2xx statuses to
/// [`ApiError::Status`].
///
/// # Errors
///
/// Returns [`ApiError::Status`] for non-success statuses and
/// [`ApiError::Parse`] if the body is not the expected JSON.
pub fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            body: body.chars().take(BODY_PREVIEW_LEN).collect(),
        });
    }

    serde_json::from_str(body).map_err(|e| ApiError::Parse {
        message: format!("{e} (body: {})", body.chars().take(BODY_PREVIEW_LEN).collect::<String>()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let api = client("https://example.com/api");
        assert_eq!(
            api.endpoint(&["development-permits"]).unwrap().as_str(),
            "https://example.com/api/development-permits"
        );

        let trailing = client("https://example.com/api/");
        assert_eq!(
            trailing.endpoint(&["amenities"]).unwrap().as_str(),
            "https://example.com/api/amenities"
        );
    }

    #[test]
    fn permit_ids_are_percent_encoded() {
        let api = client("https://example.com/api");
        assert_eq!(
            api.endpoint(&["impact_reports", "a/b c"]).unwrap().as_str(),
            "https://example.com/api/impact_reports/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = ApiClient::new(&ApiConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(ApiError::Config { .. })));
    }

    #[test]
    fn decodes_permits_body() {
        let body = r#"{"permits":[{"_id":"1","projectvalue":100}]}"#;
        let response: PermitsResponse = decode(200, body).unwrap();
        assert_eq!(response.permits.len(), 1);
        assert_eq!(response.permits[0].id, "1");
    }

    #[test]
    fn maps_error_status_and_bad_json() {
        let unavailable = decode::<PermitsResponse>(503, r#"{"error":"Backend unavailable"}"#);
        assert!(matches!(unavailable, Err(ApiError::Status { status: 503, .. })));

        let garbled = decode::<PermitsResponse>(200, "{\"permits\": [");
        assert!(matches!(garbled, Err(ApiError::Parse { .. })));
    }
}
