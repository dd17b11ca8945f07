#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Response types for the mapd edge proxy.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Header reporting whether a GET was answered from the cache.
pub const CACHE_STATUS_HEADER: &str = "X-Cache-Status";

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Body of the 503 returned when the backend cannot be reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendUnavailable {
    /// Always `"Backend unavailable"`.
    pub error: String,
    /// Underlying failure.
    pub message: String,
    /// The URL the request was forwarded to.
    pub backend_url: String,
}

impl BackendUnavailable {
    /// Builds the error body for a failed forward to `backend_url`.
    #[must_use]
    pub fn new(message: impl Into<String>, backend_url: impl Into<String>) -> Self {
        Self {
            error: "Backend unavailable".to_string(),
            message: message.into(),
            backend_url: backend_url.into(),
        }
    }
}

/// Value of the [`CACHE_STATUS_HEADER`] header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from the cache.
    Hit,
    /// Fetched from the backend and stored.
    Miss,
}
