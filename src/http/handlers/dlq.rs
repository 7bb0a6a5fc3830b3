//! DLQ inspection handlers. `fetch`'s empty-but-existing case is not an
//! error at the service level; this is where that distinction becomes an
//! HTTP status, mapping an empty batch to 204 and a populated one to 200.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::dlq::DLQ_DEFAULT_BATCH_SIZE;
use crate::domain::streams::dlq_stream;
use crate::error::Result;
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConsumeQuery {
    batch_size: Option<usize>,
}

pub async fn consume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ConsumeQuery>,
) -> Result<impl IntoResponse> {
    let batch_size = query.batch_size.unwrap_or(DLQ_DEFAULT_BATCH_SIZE);
    let messages = state.dlq.fetch(&dlq_stream(&id), batch_size).await?;
    if messages.is_empty() {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Json(messages).into_response())
    }
}

pub async fn state(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let dlq_state = state.dlq.state(&dlq_stream(&id)).await?;
    Ok(Json(dlq_state))
}

pub async fn purge(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    state.dlq.purge(&dlq_stream(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
