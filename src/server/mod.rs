//! HTTP surface
//!
//! `POST /call` is the invocation entry point used by the host runtime; the
//! remaining routes serve health probes and Prometheus scraping.

use crate::relay::EventRelay;
use crate::telemetry::RelayMetrics;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the host runtime's call identifier
pub const CALL_ID_HEADER: &str = "fn-call-id";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub stream_id: String,
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<EventRelay>,
    /// None when no recorder is installed (tests)
    pub metrics: Option<RelayMetrics>,
}

/// Create the invocation + health router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/call", post(call_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Invocation endpoint - runs the relay pipeline for one trigger payload
async fn call_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let invocation_id = headers
        .get(CALL_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let result = state.relay.handle(&invocation_id, &body).await;
    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(result))
}

/// Health endpoint - always returns 200 if process is running
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness endpoint - clients are stateless, so a running relay is ready
async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ReadyResponse {
        ready: true,
        stream_id: state.relay.stream_id().to_string(),
    })
}

/// Metrics endpoint - returns Prometheus format metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(ref metrics) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            metrics.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
    }

    #[test]
    fn test_ready_response_serialization() {
        let response = ReadyResponse {
            ready: true,
            stream_id: "ocid1.stream.oc1..s".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"ready\":true"));
    }
}
