//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Session store error.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Malformed multipart upload.
    #[error("Upload error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// Filesystem error while storing an upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No authenticated user in the session.
    #[error("Authentication required")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(err) => match err {
                DatabaseError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                DatabaseError::PermissionDenied(_) => (StatusCode::FORBIDDEN, err.to_string()),
                // AlreadyExists is 400 rather than 409 to keep the
                // register endpoint's original contract.
                DatabaseError::InvalidInput(_) | DatabaseError::AlreadyExists { .. } => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                _ => {
                    tracing::error!("Database error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
            ApiError::Session(err) => {
                tracing::error!("Session error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            ApiError::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Io(err) => {
                tracing::error!("I/O error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for request handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
