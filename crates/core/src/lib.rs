//! Shared domain types for the FlowBase client gateway and job toolkit.
//!
//! Everything here mirrors the backend's REST contract: the client reads
//! these shapes, it never writes them. The backend is the single source of
//! truth for job state.

pub mod auth;
pub mod envelope;
pub mod job;
