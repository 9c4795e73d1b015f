//! FlowBase gateway library.
//!
//! A stateless relay between the browser-facing surface and the conversion
//! backend: requests arriving under the proxy prefix are rewritten to the
//! configured backend origin and forwarded with an allow-listed header set;
//! responses come back either as re-emitted JSON or as a byte-exact raw
//! relay. Exposed as a library so integration tests and the binary
//! entrypoint share the same router construction.

pub mod config;
pub mod error;
pub mod policy;
pub mod relay;
pub mod router;
pub mod state;
