use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cards::CardError;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP clients as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("{0}")]
    NotFound(String),

    #[error("Route not found")]
    UnknownRoute,

    #[error("Card service error: {0}")]
    Upstream(#[from] CardError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            StoreError::DuplicateUsername => ApiError::DuplicateUsername,
            StoreError::NotFound(entity) => ApiError::NotFound(format!("{entity} not found")),
            StoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::DuplicateUsername => {
                (StatusCode::BAD_REQUEST, "Username already exists".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::UnknownRoute => (StatusCode::NOT_FOUND, "Route not found".to_string()),
            ApiError::Upstream(ref e) => {
                tracing::error!(error = %e, "card service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "Card service unavailable".to_string(),
                )
            }
            ApiError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
