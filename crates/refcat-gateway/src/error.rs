//! Error handling for the gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use refcat_core::{FieldIssue, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
    /// Bad request.
    #[error("{0}")]
    BadRequest(String),
    /// Unknown catalog.
    #[error("{0}")]
    NotFound(String),
    /// Payload rejected by the derived schema.
    #[error(transparent)]
    Validation(ValidationError),
    /// Storage failure; the transaction was rolled back.
    #[error("{0}")]
    Storage(String),
    /// The request exceeded its deadline; nothing was written.
    #[error("request exceeded its deadline")]
    Timeout,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub result: &'static str,
    /// Error code.
    pub code: &'static str,
    /// Error message.
    pub message: String,
    /// Field-level validation detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldIssue>>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }

        let message = self.to_string();
        let errors = match self {
            AppError::Validation(err) => Some(err.issues),
            _ => None,
        };

        let body = ErrorResponse {
            result: "error",
            code,
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<refcat_core::Error> for AppError {
    fn from(err: refcat_core::Error) -> Self {
        use refcat_core::Error;

        match err {
            Error::NotFound(name) => AppError::NotFound(format!("Table {} not found", name)),
            Error::Validation(err) => AppError::Validation(err),
            Error::Storage(_) => AppError::Storage(err.to_string()),
            Error::DeadlineExceeded => AppError::Timeout,
            Error::Schema(_) | Error::InvalidData(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}
