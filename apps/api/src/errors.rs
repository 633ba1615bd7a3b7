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

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The background-removal provider answered with a non-success status.
    /// Its response text is passed through to the caller verbatim.
    #[error("Background removal rejected (status {status}): {body}")]
    BackgroundRemovalRejected { status: u16, body: String },

    #[error("Background removal error: {0}")]
    BackgroundRemoval(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Duplicate filename: {0}")]
    DuplicateFilename(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BackgroundRemovalRejected { status, body } => {
                tracing::warn!("Background removal rejected with status {status}");
                // Flat payload: clients read `error` as the provider's own message.
                return (StatusCode::BAD_GATEWAY, Json(json!({ "error": body }))).into_response();
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::BackgroundRemoval(msg) => {
                tracing::error!("Background removal error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKGROUND_REMOVAL_ERROR",
                    "The background removal service could not be reached".to_string(),
                )
            }
            AppError::Classification(msg) => {
                tracing::error!("Classification error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "CLASSIFICATION_ERROR",
                    "The garment could not be classified".to_string(),
                )
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::DuplicateFilename(filename) => (
                StatusCode::CONFLICT,
                "DUPLICATE_FILENAME",
                format!("An item with filename {filename} already exists"),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
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
