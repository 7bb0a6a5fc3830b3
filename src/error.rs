use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// The seven error kinds named in the control-plane error taxonomy.
///
/// Each carries a stable `code` string and a free-form `details` bag so the
/// HTTP layer never has to invent new response shapes for new diagnostics.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    NotFound { message: String, details: Map<String, Value> },

    #[error("{message}")]
    BadRequest { message: String, details: Map<String, Value> },

    #[error("{message}")]
    Unprocessable { message: String, details: Map<String, Value> },

    #[error("{message}")]
    Forbidden { message: String, details: Map<String, Value> },

    #[error("{message}")]
    Conflict { message: String, details: Map<String, Value> },

    #[error("{message}")]
    NotImplemented { message: String, details: Map<String, Value> },

    #[error("{message}")]
    Internal { message: String, details: Map<String, Value> },
}

impl ServiceError {
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound { message: message.into(), details: Map::new() }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest { message: message.into(), details: Map::new() }
    }

    pub fn unprocessable<S: Into<String>>(message: S) -> Self {
        Self::Unprocessable { message: message.into(), details: Map::new() }
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden { message: message.into(), details: Map::new() }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict { message: message.into(), details: Map::new() }
    }

    pub fn not_implemented<S: Into<String>>(message: S) -> Self {
        Self::NotImplemented { message: message.into(), details: Map::new() }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), details: Map::new() }
    }

    /// Attach a diagnostic field to the `details` bag, builder-style.
    pub fn with_detail<S: Into<String>>(mut self, key: S, value: impl Into<Value>) -> Self {
        let details = match &mut self {
            Self::NotFound { details, .. }
            | Self::BadRequest { details, .. }
            | Self::Unprocessable { details, .. }
            | Self::Forbidden { details, .. }
            | Self::Conflict { details, .. }
            | Self::NotImplemented { details, .. }
            | Self::Internal { details, .. } => details,
        };
        details.insert(key.into(), value.into());
        self
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::BadRequest { .. } => "bad_request",
            Self::Unprocessable { .. } => "unprocessable_entity",
            Self::Forbidden { .. } => "forbidden",
            Self::Conflict { .. } => "status_conflict",
            Self::NotImplemented { .. } => "not_implemented",
            Self::Internal { .. } => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> &Map<String, Value> {
        match self {
            Self::NotFound { details, .. }
            | Self::BadRequest { details, .. }
            | Self::Unprocessable { details, .. }
            | Self::Forbidden { details, .. }
            | Self::Conflict { details, .. }
            | Self::NotImplemented { details, .. }
            | Self::Internal { details, .. } => details,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::BadRequest { message, .. }
            | Self::Unprocessable { message, .. }
            | Self::Forbidden { message, .. }
            | Self::Conflict { message, .. }
            | Self::NotImplemented { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(status, StatusCode::INTERNAL_SERVER_ERROR) {
            tracing::error!(error = %self, "internal error returned to client");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "code": self.code(),
            "message": self.message(),
            "details": self.details(),
        }));

        (status, body).into_response()
    }
}

/// Structured carrier for an illegal status transition, per `StatusValidationError`.
#[derive(Debug, Clone)]
pub struct StatusValidationError {
    pub current_status: String,
    pub requested_status: String,
    pub valid_transitions: Vec<String>,
}

impl std::fmt::Display for StatusValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot transition from {} to {}",
            self.current_status, self.requested_status
        )
    }
}

impl From<StatusValidationError> for ServiceError {
    fn from(e: StatusValidationError) -> Self {
        ServiceError::conflict(e.to_string())
            .with_detail("current_status", e.current_status.clone())
            .with_detail("requested_status", e.requested_status.clone())
            .with_detail(
                "valid_transitions",
                Value::Array(e.valid_transitions.iter().cloned().map(Value::String).collect()),
            )
    }
}
