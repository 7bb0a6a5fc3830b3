//! Full route table plus the middleware stack: request tracing, permissive
//! CORS (single-tenant control plane, no browser-facing auth boundary to
//! protect), a 1 MiB body limit, a per-request timeout, and panic recovery
//! that returns the same JSON error shape as every other failure instead of
//! a bare 500 page, composed with `ServiceBuilder` layering.

use std::any::Any;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::http::handlers::{dlq, health, pipeline, validate};
use crate::http::state::AppState;

/// Request bodies are size-limited to 1 MiB.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/healthz", get(health::healthz))
        .route("/api/v1/platform", get(health::platform))
        .route("/metrics", get(health::metrics_stub))
        .route("/api/v1/pipeline", post(pipeline::create).get(pipeline::list))
        .route("/api/v1/pipeline/{id}/import", post(pipeline::import))
        .route(
            "/api/v1/pipeline/{id}",
            get(pipeline::get).patch(pipeline::rename).delete(pipeline::delete),
        )
        .route("/api/v1/pipeline/{id}/metadata", patch(pipeline::update_metadata))
        .route("/api/v1/pipeline/{id}/edit", post(pipeline::edit))
        .route("/api/v1/pipeline/{id}/stop", post(pipeline::stop))
        .route("/api/v1/pipeline/{id}/resume", post(pipeline::resume))
        .route("/api/v1/pipeline/{id}/terminate", post(pipeline::terminate))
        .route("/api/v1/pipeline/{id}/health", get(pipeline::health))
        .route(
            "/api/v1/pipeline/{id}/resources",
            get(pipeline::resources).patch(pipeline::update_resources),
        )
        .route("/api/v1/pipeline/{id}/dlq/consume", get(dlq::consume))
        .route("/api/v1/pipeline/{id}/dlq/state", get(dlq::state))
        .route("/api/v1/pipeline/{id}/dlq/purge", post(dlq::purge))
        .route("/api/v1/validate/filter", post(validate::validate_filter))
        .route("/api/v1/evaluate/transform", post(validate::evaluate_transform))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(30))),
        )
        .with_state(state)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "panic in request handler".to_string()
    };
    tracing::error!(panic = %message, "request handler panicked");
    ServiceError::internal(message).into_response()
}
