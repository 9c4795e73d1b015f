//! The `{ "detail": ... }` error envelope.
//!
//! This is the one error shape shared across the whole system: the backend
//! emits it for application errors (FastAPI-style), and the gateway
//! manufactures it -- at status 502 -- for transport failures. The client
//! normalizes both by extracting `detail`.

use serde::{Deserialize, Serialize};

/// Normalized error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub detail: String,
}

impl ErrorEnvelope {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
