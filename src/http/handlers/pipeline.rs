//! Pipeline CRUD/lifecycle handlers, thin wrappers over `PipelineService`
//! that translate HTTP extractors into service calls and service results
//! into response bodies. Error mapping is free: `ServiceError` already
//! implements `IntoResponse` (`error.rs`), so every handler just propagates
//! with `?`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::pipeline_config::{PipelineConfig, ResourcesConfig, IMMUTABLE_RESOURCE_POINTERS};
use crate::error::Result;
use crate::lowering::pipeline_json::PipelineJson;
use crate::http::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<PipelineJson>,
) -> Result<impl IntoResponse> {
    let config = state.pipelines.create_pipeline(body).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

/// Accepts a raw exported pipeline document (current shape or legacy v1,
/// see `lowering::migrate`) rather than a typed `PipelineJson` body, since a
/// legacy export may carry fields the unified shape no longer has a place
/// for.
pub async fn import(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse> {
    let config = state.pipelines.import_pipeline(&id, &body).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summaries = state.pipelines.get_pipelines().await?;
    Ok(Json(summaries))
}

/// `?schema=srcA:verA&schema=srcB:verB`: axum's `Query` extractor deserializes
/// repeated keys into a `Vec<(String, String)>` via `serde_urlencoded`, which
/// is how we recover every `schema` pair instead of only the last one.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse> {
    let mut overrides = HashMap::new();
    for (key, value) in params {
        if key == "schema" {
            if let Some((source_id, version)) = value.split_once(':') {
                overrides.insert(source_id.to_string(), version.to_string());
            }
        }
    }
    let config = state.pipelines.get_pipeline(&id, &overrides).await?;
    Ok(Json(config))
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RenameRequest>,
) -> Result<impl IntoResponse> {
    let config = state.pipelines.update_pipeline_name(&id, body.name).await?;
    Ok(Json(config))
}

pub async fn update_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(metadata): Json<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    let config = state.pipelines.update_pipeline_metadata(&id, metadata).await?;
    Ok(Json(config))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PipelineJson>,
) -> Result<impl IntoResponse> {
    let config = state.pipelines.edit_pipeline(&id, body).await?;
    Ok(Json(config))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.pipelines.delete_pipeline(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct TransitionResponse {
    status: crate::domain::status::PipelineStatus,
}

pub async fn stop(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let status = state.pipelines.stop_pipeline(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(TransitionResponse { status })))
}

pub async fn resume(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let status = state.pipelines.resume_pipeline(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(TransitionResponse { status })))
}

pub async fn terminate(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let status = state.pipelines.terminate_pipeline(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(TransitionResponse { status })))
}

pub async fn health(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let health = state.pipelines.get_pipeline_health(&id).await?;
    Ok(Json(health))
}

#[derive(Debug, Serialize)]
struct ResourcesResponse {
    resources: Option<ResourcesConfig>,
    immutable_after_create: &'static [&'static str],
}

pub async fn resources(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let config: PipelineConfig = state.pipelines.get_pipeline(&id, &HashMap::new()).await?;
    Ok(Json(ResourcesResponse {
        resources: config.resources,
        immutable_after_create: IMMUTABLE_RESOURCE_POINTERS,
    }))
}

/// `update_pipeline_resources` is a service operation with no route of its
/// own otherwise; exposed here as a PATCH alongside the existing GET rather
/// than left unreachable from HTTP.
pub async fn update_resources(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(resources): Json<ResourcesConfig>,
) -> Result<impl IntoResponse> {
    let config = state.pipelines.update_pipeline_resources(&id, resources).await?;
    Ok(Json(config))
}
