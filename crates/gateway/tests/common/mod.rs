//! Shared harness for gateway integration tests.
//!
//! Tests drive the real router (same middleware stack as `main.rs`) with
//! `tower::ServiceExt::oneshot` while the "backend origin" is a stub axum
//! server bound to an ephemeral local port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use flowbase_gateway::config::GatewayConfig;
use flowbase_gateway::router;
use flowbase_gateway::state::AppState;

/// Build a test `GatewayConfig` pointing at the given backend origin.
pub fn test_config(api_url: String) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_url,
        cors_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// Build the full gateway app with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same stack (panic recovery, request ID, tracing, CORS)
/// that production uses.
pub fn build_test_app(api_url: String) -> Router {
    let state = AppState::new(test_config(api_url));

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(router::router())
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Start a stub upstream server on an ephemeral port; returns its origin URL.
pub async fn spawn_upstream(routes: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub upstream");
    let addr = listener.local_addr().expect("stub upstream addr");

    tokio::spawn(async move {
        axum::serve(listener, routes).await.expect("stub upstream");
    });

    format!("http://{addr}")
}

/// An origin that refuses connections (bound then immediately released).
pub async fn unreachable_origin() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr: SocketAddr = listener.local_addr().expect("throwaway addr");
    drop(listener);
    format!("http://{addr}")
}

/// Issue a GET request against the in-process app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request"),
    )
    .await
    .expect("app response")
}

/// Collect a response body to bytes.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Recorded snapshot of one request the stub upstream received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

impl Recorded {
    pub fn capture(
        path: &str,
        query: Option<&str>,
        headers: &axum::http::HeaderMap,
    ) -> Self {
        Self {
            path: path.to_string(),
            query: query.map(str::to_string),
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            content_type: headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Shared recording slot for stub handlers.
pub type Recordings = Arc<std::sync::Mutex<Vec<Recorded>>>;

pub fn recordings() -> Recordings {
    Arc::new(std::sync::Mutex::new(Vec::new()))
}
