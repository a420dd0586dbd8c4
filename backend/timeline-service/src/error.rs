//! Error types for timeline-service.
//!
//! Errors are converted to appropriate HTTP responses for API clients.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::store::StoreError;

/// Result type for timeline-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced user or post absent (or not owned by the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request body failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable store unreachable or timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Cache unreachable; non-fatal, callers degrade to direct store reads
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_)
            | AppError::CacheUnavailable(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            // Author-scoped misses are indistinguishable from absence at the
            // HTTP boundary: both surface as 404.
            StoreError::Unauthorized(what) => AppError::NotFound(what),
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
