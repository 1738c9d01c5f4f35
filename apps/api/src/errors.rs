use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::session::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Unavailable(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Failures the interview core absorbs instead of surfacing to the candidate.
///
/// These never cross the HTTP boundary. They exist so every degraded path is
/// logged with a stable kind and can be carried in question provenance.
#[derive(Debug, Error)]
pub enum CoreFailure {
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("duplicate question (similarity {ratio:.2} >= {threshold:.2}, attempt {attempt})")]
    DuplicateQuestion {
        ratio: f64,
        threshold: f64,
        attempt: u32,
    },

    #[error("malformed evaluation response")]
    MalformedEvaluation,

    #[error("evaluation unavailable: {0}")]
    EvaluationUnavailable(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl CoreFailure {
    /// Stable identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreFailure::GenerationUnavailable(_) => "generation_unavailable",
            CoreFailure::DuplicateQuestion { .. } => "duplicate_question",
            CoreFailure::MalformedEvaluation => "malformed_evaluation",
            CoreFailure::EvaluationUnavailable(_) => "evaluation_unavailable",
            CoreFailure::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}
