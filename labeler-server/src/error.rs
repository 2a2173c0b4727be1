//! Error types for labeler-server
//!
//! Maps the core error taxonomy onto HTTP status codes with a JSON
//! `{"error": message}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use labeler_common::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Error from the bookkeeping core
    #[error(transparent)]
    Common(#[from] CoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Common(err) => match err {
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::InvalidInput(_) | CoreError::EmptyHistory => StatusCode::BAD_REQUEST,
                CoreError::AccessDenied(_) => StatusCode::FORBIDDEN,
                CoreError::Internal(_) | CoreError::Io(_) | CoreError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{} {}", status, message);
        } else {
            tracing::warn!("{} {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
