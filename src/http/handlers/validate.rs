//! Standalone expression endpoints: validating a filter expression against
//! a caller-supplied field list, and evaluating a transform expression
//! against a sample, without a persisted pipeline behind either. Validation
//! only ever compiles, never executes against real data; `evaluate` is the
//! one place a sample is actually run.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::pipeline_config::SchemaField;
use crate::error::{Result, ServiceError};
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateFilterRequest {
    pub expression: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Serialize)]
pub struct ValidateFilterResponse {
    pub valid: bool,
    pub diagnostic: Option<String>,
}

pub async fn validate_filter(
    State(state): State<AppState>,
    Json(body): Json<ValidateFilterRequest>,
) -> Result<impl IntoResponse> {
    match state.compiler.compile(&body.expression, &body.fields) {
        Ok(()) => Ok(Json(ValidateFilterResponse { valid: true, diagnostic: None })),
        Err(diag) => Ok(Json(ValidateFilterResponse { valid: false, diagnostic: Some(diag.describe()) })),
    }
}

#[derive(Debug, Deserialize)]
pub struct EvaluateTransformRequest {
    pub expression: String,
    pub sample: Value,
}

pub async fn evaluate_transform(
    State(state): State<AppState>,
    Json(body): Json<EvaluateTransformRequest>,
) -> Result<impl IntoResponse> {
    let result = state
        .compiler
        .evaluate(&body.expression, &body.sample)
        .map_err(|diag| ServiceError::unprocessable(diag.describe()))?;
    Ok(Json(result))
}
