use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateEmail,

    /// Shared by unknown-email and wrong-password so callers cannot tell them apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    Session(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code included next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NotAuthenticated => "NOT_AUTHENTICATED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Session(_) => "SESSION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateEmail | AppError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Session(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::DuplicateEmail
            | AppError::InvalidCredentials
            | AppError::NotAuthenticated => self.to_string(),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                "The resume analysis service is unavailable".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "Server error".to_string()
            }
            AppError::Session(e) => {
                tracing::error!("Session store error: {e}");
                "Server error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "Server error".to_string()
            }
        };

        let body = Json(json!({
            "message": message,
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}
