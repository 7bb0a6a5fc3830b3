//! Liveness and identity probes. These are meant to never fail except on
//! process shutdown, so neither touches the per-pipeline lock.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::http::state::AppState;

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn platform(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "orchestrator": state.pipelines.get_orchestrator_type(),
        "api_version": "v1",
    }))
}

/// `GET /metrics` is reserved for a future Prometheus exporter; clients get
/// a typed 501 instead of a bare 404 until one exists.
pub async fn metrics_stub() -> impl IntoResponse {
    crate::error::ServiceError::not_implemented("metrics endpoint is not implemented by this core")
        .into_response()
}
