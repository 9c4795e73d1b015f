//! Outbound header allow-list.
//!
//! Rather than copying headers ad hoc per call site, the forwarding policy
//! is a single auditable table: anything not listed here is dropped on the
//! way to the backend.

use axum::http::header::{HeaderMap, HeaderName, AUTHORIZATION, CONTENT_TYPE};

/// How an allow-listed inbound header is treated when building the outbound
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    /// Copy the header byte-identical if the inbound request carries it;
    /// never synthesize it when absent.
    ForwardIfPresent,
    /// Copy if present, except on multipart uploads -- there the header is
    /// deliberately omitted so the HTTP client generates its own boundary.
    ForwardUnlessMultipart,
}

/// The complete forwarding policy. Order is irrelevant; absence means drop.
pub const HEADER_POLICY: &[(HeaderName, HeaderRule)] = &[
    (AUTHORIZATION, HeaderRule::ForwardIfPresent),
    (CONTENT_TYPE, HeaderRule::ForwardUnlessMultipart),
];

/// Build the outbound header set for one relayed request.
pub fn outbound_headers(inbound: &HeaderMap, is_multipart: bool) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for (name, rule) in HEADER_POLICY {
        if *rule == HeaderRule::ForwardUnlessMultipart && is_multipart {
            continue;
        }
        if let Some(value) = inbound.get(name) {
            outbound.insert(name.clone(), value.clone());
        }
    }

    outbound
}

/// Whether an inbound `Content-Type` value declares a multipart form body.
pub fn is_multipart(inbound: &HeaderMap) -> bool {
    inbound
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("multipart/form-data"))
}
