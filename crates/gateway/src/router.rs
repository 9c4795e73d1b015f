//! Route table and proxy handlers.
//!
//! The proxy surface is deliberately narrow: any path under `/api/proxy/`,
//! GET and POST only. Other methods get the router's default 405 -- the
//! backend contract needs nothing else.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, RawQuery, Request, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{GatewayError, GatewayResult};
use crate::policy;
use crate::relay::{self, OutboundBody, RelayResponse};
use crate::state::AppState;

/// Inbound body cap. The backend enforces the 10 MB upload limit; the
/// gateway only has to let such uploads through (plus multipart framing
/// overhead) rather than trip axum's default 2 MB extractor limit.
pub const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Build the gateway router (health check + proxy surface).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/proxy/{*path}", get(proxy_get).post(proxy_post))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Relay a GET request (job listings, status, preview, report, download).
async fn proxy_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> GatewayResult<RelayResponse> {
    let target = relay::target_url(&state.config.api_url, &path, query.as_deref());
    let outbound = policy::outbound_headers(&headers, false);
    relay::forward_get(&state.http, &target, outbound).await
}

/// Relay a POST request (auth, upload, retry).
///
/// Multipart bodies are decoded and rebuilt as structured form data so
/// reqwest can generate its own boundary; everything else is forwarded as
/// opaque bytes.
async fn proxy_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    request: Request,
) -> GatewayResult<RelayResponse> {
    let target = relay::target_url(&state.config.api_url, &path, query.as_deref());
    let headers = request.headers().clone();
    let is_multipart = policy::is_multipart(&headers);

    let body = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| GatewayError::BadRequest(e.to_string()))?;
        OutboundBody::Form(rebuild_form(multipart).await?)
    } else {
        let bytes = Bytes::from_request(request, &state)
            .await
            .map_err(|e| GatewayError::BadRequest(e.to_string()))?;
        OutboundBody::Bytes(bytes)
    };

    let outbound = policy::outbound_headers(&headers, is_multipart);
    relay::forward_post(&state.http, &target, outbound, body).await
}

/// Rebuild an inbound multipart body as an outbound `reqwest` form,
/// preserving field name, file name, part content type, and exact bytes.
async fn rebuild_form(mut multipart: Multipart) -> GatewayResult<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| GatewayError::BadRequest(e.to_string()))?;

        let mut part = reqwest::multipart::Part::bytes(data.to_vec());
        if let Some(file_name) = file_name {
            part = part.file_name(file_name);
        }
        if let Some(content_type) = content_type {
            part = part
                .mime_str(&content_type)
                .map_err(|e| GatewayError::BadRequest(e.to_string()))?;
        }

        form = form.part(name, part);
    }

    Ok(form)
}
