//! HTTP handler functions for the edge proxy.

use actix_web::http::{Method, StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, web};
use mapd_proxy_models::{ApiHealth, BackendUnavailable, CACHE_STATUS_HEADER, CacheStatus};

use crate::upstream::{UpstreamRequest, UpstreamResponse, forwards_request_header};
use crate::{API_PREFIX, PREFLIGHT_MAX_AGE_SECS, ProxyState};

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Everything outside `/api`: preflights are answered, the rest is 404.
pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return preflight();
    }
    HttpResponse::NotFound()
        .content_type("text/plain; charset=utf-8")
        .body("Not found")
}

/// `* /api/{path}`
///
/// Forwards the request to the backend. GETs are served from and stored
/// in the response cache; other methods always go to the backend.
pub async fn proxy(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<ProxyState>,
) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return preflight();
    }

    let path = req.path().strip_prefix(API_PREFIX).unwrap_or_default();
    let url = state.config.forward_url(path, req.query_string());
    let is_get = req.method() == Method::GET;
    let ttl = state.cache.ttl().as_secs();

    if is_get && let Some(cached) = state.cache.get(&url) {
        log::debug!("Cache hit for {url}");
        return relay(cached, Some((CacheStatus::Hit, ttl)));
    }

    let headers = req
        .headers()
        .iter()
        .filter(|(name, _)| forwards_request_header(name.as_str()))
        .filter_map(|(name, value)| {
            Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
        })
        .collect();
    let request = UpstreamRequest {
        method: req.method().as_str().to_string(),
        url: url.clone(),
        headers,
        body: if is_get { Vec::new() } else { body.to_vec() },
    };

    match state.upstream.forward(request).await {
        Ok(response) if is_get && response.is_success() => {
            state.cache.insert(url, response.clone());
            relay(response, Some((CacheStatus::Miss, ttl)))
        }
        Ok(response) => relay(response, None),
        Err(e) => {
            log::error!("Backend unavailable for {url}: {e}");
            HttpResponse::ServiceUnavailable().json(BackendUnavailable::new(e.to_string(), url))
        }
    }
}

fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE_SECS.to_string()))
        .finish()
}

/// Builds the client response from a backend response. The backend's own
/// CORS headers are dropped in favour of the proxy's.
fn relay(response: UpstreamResponse, cache: Option<(CacheStatus, u64)>) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    for (name, value) in &response.headers {
        if name.to_ascii_lowercase().starts_with("access-control-") {
            continue;
        }
        builder.append_header((name.as_str(), value.as_str()));
    }
    if let Some((cache_status, ttl)) = cache {
        builder.insert_header((header::CACHE_CONTROL, format!("public, max-age={ttl}")));
        builder.insert_header((CACHE_STATUS_HEADER, cache_status.as_ref()));
    }
    builder.body(response.body)
}
