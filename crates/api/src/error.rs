//! API error types and handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use petly_shared::StoreError;
use serde_json::json;

use crate::auth::validation::FieldErrors;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(FieldErrors),
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),

            // Validation
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Validation failed".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),

            // Resources
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),

            // Internal
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database error".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", self.to_string()),
        };

        let body = match &self {
            ApiError::Validation(fields) => Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "fields": fields,
                }
            })),
            _ => Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            })),
        };

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => {
                ApiError::Validation(FieldErrors::single(field.as_str(), "is already taken"))
            }
            StoreError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ApiError::Database(e.to_string())
            }
        }
    }
}

/// Malformed or non-JSON request bodies
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Rejected request body");
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Route fallback so unknown paths answer in the same error format
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
