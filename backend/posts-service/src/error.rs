/// Error types for Posts Service
///
/// This module defines all error types that can occur in the posts-service.
/// Errors are converted to appropriate HTTP responses for API clients.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::forms::FormRejection;
use crate::routes;

/// Result type for posts-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// PostgreSQL SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Write attempted without an authenticated identity
    #[error("Unauthorized: authentication required")]
    Unauthorized,

    /// Authenticated, but not the owner of the post
    #[error("Forbidden: post {post_id} belongs to another author")]
    Forbidden { post_id: i64 },

    /// Missing group, post or author
    #[error("Not found: {0}")]
    NotFound(String),

    /// Submitted form failed validation
    #[error("Validation error: {} field(s) rejected", .0.errors.len())]
    Validation(FormRejection),

    /// Uniqueness constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FOUND,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            // The post stays untouched; send the caller back to its read view.
            AppError::Forbidden { post_id } => HttpResponse::Found()
                .insert_header((header::LOCATION, routes::post_detail(*post_id)))
                .finish(),
            AppError::Validation(rejection) => HttpResponse::build(status).json(rejection),
            AppError::Database(msg) | AppError::Internal(msg) => {
                tracing::error!("request failed: {}", msg);
                HttpResponse::build(status).json(serde_json::json!({
                    "error": "Internal server error",
                    "status": status.as_u16(),
                }))
            }
            _ => HttpResponse::build(status).json(serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            })),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("record".to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound(db.message().to_string()),
                Some(UNIQUE_VIOLATION) => AppError::Conflict(db.message().to_string()),
                _ => AppError::Database(err.to_string()),
            },
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
