//! The forwarding core: target URL construction, the outbound send, and the
//! tagged relay of the upstream response.
//!
//! A relayed response is always one of two variants -- re-emitted JSON or a
//! byte-exact raw body -- never an untyped blob. Upstream application errors
//! (non-2xx) pass through unchanged; only network-level failures surface as
//! [`GatewayError::Upstream`](crate::error::GatewayError::Upstream).

use axum::body::Bytes;
use axum::http::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::GatewayResult;

/// Build the upstream target URL.
///
/// `origin + "/" + path`, with `"?" + query` appended iff the raw query
/// string is non-empty. The query is passed through unmodified.
pub fn target_url(origin: &str, path: &str, query: Option<&str>) -> String {
    let origin = origin.trim_end_matches('/');
    match query {
        Some(q) if !q.is_empty() => format!("{origin}/{path}?{q}"),
        _ => format!("{origin}/{path}"),
    }
}

/// Body of an outbound POST relay.
pub enum OutboundBody {
    /// Opaque bytes, forwarded verbatim with the inbound `Content-Type`.
    /// The gateway never re-encodes JSON it relays.
    Bytes(Bytes),
    /// Structured multipart form, rebuilt part-by-part from the inbound
    /// request. reqwest generates the boundary, which is why the inbound
    /// `Content-Type` is dropped by the header policy.
    Form(reqwest::multipart::Form),
}

/// One relayed upstream response.
#[derive(Debug)]
pub enum RelayResponse {
    /// The upstream body parsed as JSON; re-emitted as JSON with the
    /// upstream status code.
    Structured(StatusCode, serde_json::Value),
    /// Byte-exact relay of the upstream body with the upstream status code.
    /// `Content-Type` / `Content-Disposition` are copied through when the
    /// read path captured them (file downloads need both).
    Raw {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        content_disposition: Option<HeaderValue>,
        body: Bytes,
    },
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        match self {
            RelayResponse::Structured(status, value) => (status, Json(value)).into_response(),
            RelayResponse::Raw {
                status,
                content_type,
                content_disposition,
                body,
            } => {
                let mut response = (status, body).into_response();
                if let Some(ct) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, ct);
                }
                if let Some(cd) = content_disposition {
                    response.headers_mut().insert(CONTENT_DISPOSITION, cd);
                }
                response
            }
        }
    }
}

/// Forward a GET request and relay the response.
///
/// If the upstream `Content-Type` declares JSON, the body is parsed and
/// re-emitted as structured JSON; a parse failure despite the declared type
/// falls back to a raw relay instead of erroring. Non-JSON responses relay
/// raw with `Content-Type` and `Content-Disposition` copied through.
pub async fn forward_get(
    http: &reqwest::Client,
    target: &str,
    headers: HeaderMap,
) -> GatewayResult<RelayResponse> {
    tracing::debug!(target, "Forwarding GET to backend");

    let upstream = http.get(target).headers(headers).send().await?;

    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let content_disposition = upstream.headers().get(CONTENT_DISPOSITION).cloned();
    let body = upstream.bytes().await?;

    if declares_json(content_type.as_ref()) {
        return Ok(match serde_json::from_slice(&body) {
            Ok(value) => RelayResponse::Structured(status, value),
            Err(err) => {
                tracing::warn!(
                    target,
                    error = %err,
                    "Upstream declared JSON but body did not parse; relaying raw"
                );
                RelayResponse::Raw {
                    status,
                    content_type: None,
                    content_disposition: None,
                    body,
                }
            }
        });
    }

    Ok(RelayResponse::Raw {
        status,
        content_type,
        content_disposition,
        body,
    })
}

/// Forward a POST request and relay the response.
///
/// The upstream body is parsed as JSON opportunistically: success re-emits
/// it structured, failure relays the raw bytes. Either way the upstream
/// status code is preserved.
pub async fn forward_post(
    http: &reqwest::Client,
    target: &str,
    headers: HeaderMap,
    body: OutboundBody,
) -> GatewayResult<RelayResponse> {
    tracing::debug!(target, "Forwarding POST to backend");

    let request = http.post(target).headers(headers);
    let request = match body {
        OutboundBody::Bytes(bytes) => request.body(bytes),
        OutboundBody::Form(form) => request.multipart(form),
    };

    let upstream = request.send().await?;
    let status = upstream.status();
    let body = upstream.bytes().await?;

    Ok(match serde_json::from_slice(&body) {
        Ok(value) => RelayResponse::Structured(status, value),
        Err(_) => RelayResponse::Raw {
            status,
            content_type: None,
            content_disposition: None,
            body,
        },
    })
}

/// Whether an upstream `Content-Type` value declares a JSON body.
fn declares_json(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}
