//! API Error Types
//!
//! Maps gateway failures to HTTP responses. Every error body carries
//! `ok: false`, a human-readable `error`, a machine `code` and a generated
//! `request_id` that also appears in the log line.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::{Device, RegistryError};

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body missing fields or malformed
    #[error("{0}")]
    Validation(String),

    /// Device identity already registered
    #[error("{message}")]
    Conflict { message: String, existing: Device },

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Broker rejected a gateway publish
    #[error("{0}")]
    Publish(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::Validation(_) => ApiError::Validation(message),
            RegistryError::Conflict { existing } => ApiError::Conflict { message, existing },
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<Device>,
    pub request_id: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Publish(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PUBLISH_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API request rejected"
            );
        }

        let error = self.to_string();
        let existing = match self {
            ApiError::Conflict { existing, .. } => Some(existing),
            _ => None,
        };

        let body = ErrorResponse {
            ok: false,
            error,
            code: code.to_string(),
            existing,
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
