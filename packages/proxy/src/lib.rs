#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Edge proxy for the mapd API.
//!
//! Requests under `/api` are forwarded to the backend origin with the
//! prefix stripped. Successful GET responses are cached in memory for a
//! short TTL, keyed by the full forwarded URL. Every response carries
//! permissive CORS headers, and a backend that cannot be reached yields a
//! structured 503.

pub mod cache;
mod handlers;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware, web};

use crate::cache::ResponseCache;
use crate::upstream::{ReqwestUpstream, Upstream};

/// Path prefix of proxied requests.
pub const API_PREFIX: &str = "/api";

/// Environment variable holding the backend origin.
pub const BACKEND_URL_ENV: &str = "MAPD_BACKEND_URL";

/// Environment variable holding the cache TTL in seconds.
pub const CACHE_TTL_ENV: &str = "MAPD_CACHE_TTL_SECS";

/// Backend origin used when [`BACKEND_URL_ENV`] is unset.
pub const DEFAULT_BACKEND_URL: &str = "https://api.mapd.tech";

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_PORT: u16 = 8787;
const UPSTREAM_TIMEOUT_SECS: u64 = 120;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// How long browsers may cache a preflight answer.
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 86_400;

/// Proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Backend origin, without a trailing slash.
    pub backend_url: String,
    /// Lifetime of cached GET responses.
    pub cache_ttl: Duration,
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            bind_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ProxyConfig {
    /// Reads `MAPD_BACKEND_URL`, `MAPD_CACHE_TTL_SECS`, `BIND_ADDR` and
    /// `PORT`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backend_url = std::env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.backend_url);
        let cache_ttl = std::env::var(CACHE_TTL_ENV)
            .ok()
            .and_then(|secs| secs.parse().ok())
            .map_or(defaults.cache_ttl, Duration::from_secs);
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            cache_ttl,
            bind_addr,
            port,
        }
    }

    /// The backend URL for a request path (already stripped of
    /// [`API_PREFIX`]) and raw query string.
    #[must_use]
    pub fn forward_url(&self, path: &str, query: &str) -> String {
        let base = self.backend_url.trim_end_matches('/');
        if query.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}{path}?{query}")
        }
    }
}

/// Shared proxy state.
pub struct ProxyState {
    pub config: ProxyConfig,
    pub cache: ResponseCache,
    pub upstream: Arc<dyn Upstream>,
}

impl ProxyState {
    #[must_use]
    pub fn new(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            cache: ResponseCache::new(config.cache_ttl),
            config,
            upstream,
        }
    }
}

/// Adds the CORS headers to every response that does not set them.
#[must_use]
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", ALLOW_ORIGIN))
        .add(("Access-Control-Allow-Methods", ALLOW_METHODS))
        .add(("Access-Control-Allow-Headers", ALLOW_HEADERS))
}

/// Registers the proxy routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .service(web::scope(API_PREFIX).default_service(web::to(handlers::proxy)))
        .default_service(web::to(handlers::fallback));
}

/// Starts the proxy server.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client cannot be built
/// or the server fails to bind or run.
pub async fn run_server() -> std::io::Result<()> {
    let config = ProxyConfig::from_env();
    let upstream = ReqwestUpstream::new(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
        .map_err(std::io::Error::other)?;

    log::info!(
        "Forwarding {API_PREFIX}/* to {} (cache TTL {}s)",
        config.backend_url,
        config.cache_ttl.as_secs()
    );

    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    let state = web::Data::new(ProxyState::new(config, Arc::new(upstream)));

    log::info!("Starting proxy on {bind_addr}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use mapd_proxy_models::ApiHealth;

    use super::*;
    use crate::upstream::{ProxyError, UpstreamRequest, UpstreamResponse};

    #[derive(Default)]
    struct FakeUpstream {
        response: Option<UpstreamResponse>,
        calls: Mutex<Vec<UpstreamRequest>>,
    }

    impl FakeUpstream {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                response: Some(UpstreamResponse {
                    status,
                    headers: vec![
                        ("content-type".to_string(), "application/json".to_string()),
                        ("access-control-allow-origin".to_string(), "https://backend.test".to_string()),
                    ],
                    body: body.as_bytes().to_vec(),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_header(mut self, name: &str, value: &str) -> Self {
            if let Some(response) = self.response.as_mut() {
                response.headers.push((name.to_string(), value.to_string()));
            }
            self
        }

        fn calls(&self) -> Vec<UpstreamRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Upstream for FakeUpstream {
        async fn forward(
            &self,
            request: UpstreamRequest,
        ) -> Result<UpstreamResponse, ProxyError> {
            self.calls.lock().unwrap().push(request);
            self.response.clone().ok_or_else(|| ProxyError::InvalidRequest {
                message: "connection refused".to_string(),
            })
        }
    }

    fn state(upstream: Arc<FakeUpstream>) -> web::Data<ProxyState> {
        let config = ProxyConfig {
            backend_url: "https://backend.test".to_string(),
            ..ProxyConfig::default()
        };
        web::Data::new(ProxyState::new(config, upstream))
    }

    macro_rules! app {
        ($upstream:expr) => {
            actix_test::init_service(
                App::new()
                    .wrap(cors_headers())
                    .app_data(state($upstream))
                    .configure(configure),
            )
            .await
        };
    }

    fn header<B>(resp: &ServiceResponse<B>, name: &str) -> Option<String> {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[test]
    fn forward_url_joins_path_and_query() {
        let config = ProxyConfig {
            backend_url: "https://backend.test/".to_string(),
            ..ProxyConfig::default()
        };
        assert_eq!(
            config.forward_url("/amenities", "lon=1&lat=2"),
            "https://backend.test/amenities?lon=1&lat=2"
        );
        assert_eq!(config.forward_url("", ""), "https://backend.test");
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!(Arc::new(FakeUpstream::default()));
        let req = actix_test::TestRequest::get().uri("/health").to_request();
        let health: ApiHealth = actix_test::call_and_read_body_json(&app, req).await;
        assert!(health.healthy);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn get_is_cached_by_forwarded_url() {
        let upstream = Arc::new(FakeUpstream::answering(200, r#"{"amenities":{}}"#));
        let app = app!(upstream.clone());

        let req = actix_test::TestRequest::get()
            .uri("/api/amenities?lon=-123.1&lat=49.2&distance=0.5")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "x-cache-status").as_deref(), Some("MISS"));
        assert_eq!(
            header(&resp, "cache-control").as_deref(),
            Some("public, max-age=300")
        );
        assert_eq!(header(&resp, "access-control-allow-origin").as_deref(), Some("*"));

        let req = actix_test::TestRequest::get()
            .uri("/api/amenities?lon=-123.1&lat=49.2&distance=0.5")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(header(&resp, "x-cache-status").as_deref(), Some("HIT"));
        assert_eq!(actix_test::read_body(resp).await, r#"{"amenities":{}}"#.as_bytes());

        let calls = upstream.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(
            calls[0].url,
            "https://backend.test/amenities?lon=-123.1&lat=49.2&distance=0.5"
        );
    }

    #[actix_web::test]
    async fn failed_get_is_not_cached() {
        let upstream = Arc::new(FakeUpstream::answering(500, r#"{"error":"boom"}"#));
        let app = app!(upstream.clone());

        for _ in 0..2 {
            let req = actix_test::TestRequest::get()
                .uri("/api/development-permits")
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(header(&resp, "x-cache-status").is_none());
        }
        assert_eq!(upstream.calls().len(), 2);
    }

    #[actix_web::test]
    async fn post_is_forwarded_and_never_cached() {
        let upstream = Arc::new(FakeUpstream::answering(200, r#"{"impact_analysis":{}}"#));
        let app = app!(upstream.clone());
        let body = r#"{"longitude":-123.12,"latitude":49.28,"project_description":"Test"}"#;

        for _ in 0..2 {
            let req = actix_test::TestRequest::post()
                .uri("/api/hypothetical-impact-report")
                .insert_header(("content-type", "application/json"))
                .set_payload(body)
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(header(&resp, "x-cache-status").is_none());
        }

        let calls = upstream.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].url, "https://backend.test/hypothetical-impact-report");
        assert_eq!(calls[0].body, body.as_bytes());
        assert!(
            calls[0]
                .headers
                .iter()
                .any(|(name, value)| name == "content-type" && value == "application/json")
        );
    }

    #[actix_web::test]
    async fn repeated_upstream_headers_are_all_relayed() {
        let upstream = Arc::new(
            FakeUpstream::answering(200, "{}")
                .with_header("set-cookie", "a=1")
                .with_header("set-cookie", "b=2"),
        );
        let app = app!(upstream);

        let req = actix_test::TestRequest::get()
            .uri("/api/development-permits")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        let cookies: Vec<&str> = resp
            .headers()
            .get_all("set-cookie")
            .filter_map(|v| v.to_str().ok())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[actix_web::test]
    async fn unreachable_backend_is_503() {
        let app = app!(Arc::new(FakeUpstream::default()));
        let req = actix_test::TestRequest::get()
            .uri("/api/impact_reports/abc")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(header(&resp, "access-control-allow-origin").as_deref(), Some("*"));
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Backend unavailable");
        assert_eq!(body["backend_url"], "https://backend.test/impact_reports/abc");
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
    }

    #[actix_web::test]
    async fn options_is_answered_locally() {
        let upstream = Arc::new(FakeUpstream::answering(200, "{}"));
        let app = app!(upstream.clone());

        for uri in ["/api/amenities", "/anything"] {
            let req = actix_test::TestRequest::default()
                .method(actix_web::http::Method::OPTIONS)
                .uri(uri)
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
            assert_eq!(header(&resp, "access-control-max-age").as_deref(), Some("86400"));
            assert_eq!(
                header(&resp, "access-control-allow-methods").as_deref(),
                Some(ALLOW_METHODS)
            );
        }
        assert!(upstream.calls().is_empty());
    }

    #[actix_web::test]
    async fn other_paths_are_not_found() {
        let upstream = Arc::new(FakeUpstream::answering(200, "{}"));
        let app = app!(upstream.clone());

        for uri in ["/", "/apix/amenities"] {
            let req = actix_test::TestRequest::get().uri(uri).to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert_eq!(header(&resp, "access-control-allow-origin").as_deref(), Some("*"));
            assert_eq!(actix_test::read_body(resp).await, "Not found".as_bytes());
        }
        assert!(upstream.calls().is_empty());
    }
}
