use std::sync::Arc;

use crate::config::GatewayConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the reqwest client is an `Arc` internally, so all
/// relays share one connection pool.
#[derive(Clone)]
pub struct AppState {
    /// Outbound HTTP client used to reach the backend origin.
    pub http: reqwest::Client,
    /// Gateway configuration (backend origin, bind address, CORS).
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// The outbound client is built without a request timeout: conversion
    /// jobs can produce slow preview/download responses and the original
    /// contract enforces no per-call deadline. An unresponsive origin can
    /// therefore stall a relay indefinitely -- known limitation.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}
