//! Domain error types for the calendar server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body could not be decoded
    #[error("{0}")]
    Decode(String),

    /// Semantically invalid fields
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Identity provider rejected the presented token
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Missing or invalid session credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credential, insufficient rights
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate or contended state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredential(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_code, response_message) = match self {
            AppError::Decode(msg) => {
                return HttpResponse::build(status)
                    .content_type(ContentType::plaintext())
                    .body(msg.clone());
            }
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
            AppError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            AppError::InvalidCredential(_) => ("INVALID_CREDENTIAL", self.to_string()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::Forbidden(_) => ("FORBIDDEN", self.to_string()),
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::Conflict(_) => ("CONFLICT", self.to_string()),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(format!("Invalid request body: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}
