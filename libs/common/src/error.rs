use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Error taxonomy for the credit decision service. Variants map 1:1 onto the
/// kinds enumerated in the error handling design; each carries enough detail
/// to audit the failure without leaking internals to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Idempotency key reused with a different request body")]
    IdempotencyConflict,

    #[error("Feature validation error: {0}")]
    FeatureValidation(String),

    #[error("Critical model failure, no credit model succeeded: {0:?}")]
    CriticalModelFailure(Vec<String>),

    #[error("Decision was not persisted: {0}")]
    DecisionNotPersisted(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::IdempotencyConflict => StatusCode::CONFLICT,
            AppError::FeatureValidation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CriticalModelFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DecisionNotPersisted(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let AppError::RateLimited { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.json(ErrorResponse {
            error: self.status_code().to_string(),
            message: self.to_string(),
        })
    }
}
