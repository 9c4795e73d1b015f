//! FlowBase job toolkit: typed backend operations, token persistence, and
//! the polling lifecycle controller.
//!
//! The pieces compose leaves-first: a [`token::TokenStore`] holds the opaque
//! bearer credential, the [`api::JobApiClient`] calls the gateway's proxy
//! surface attaching that credential, and the [`poll`]/[`tracker`] layer
//! drives repeated status checks on a timer until a job reaches a terminal
//! state.

pub mod api;
pub mod poll;
pub mod token;
pub mod tracker;

pub use api::{ApiError, JobApiClient, ListJobsQuery};
pub use poll::{PollEvent, PollHandle, DEFAULT_POLL_INTERVAL};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use tracker::{JobTracker, TrackerError, TrackerEvent, TrackerState};
