use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowbase_core::envelope::ErrorEnvelope;

/// Errors the gateway itself can produce while relaying.
///
/// Upstream *application* errors (non-2xx from the backend) are not errors
/// here -- they relay through [`RelayResponse`](crate::relay::RelayResponse)
/// with their original status and body. `Upstream` covers network-level
/// failures only, and is the single error shape the gateway manufactures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The forwarded request never completed: origin unreachable, DNS/TLS
    /// failure, protocol error, or an unreadable upstream body.
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    /// The inbound request body could not be read (e.g. malformed multipart).
    #[error("{0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            GatewayError::Upstream(err) => {
                tracing::warn!(error = %err, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, Json(ErrorEnvelope::new(detail))).into_response()
    }
}
