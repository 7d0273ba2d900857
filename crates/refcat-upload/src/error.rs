//! Error type shared by the upload server and the uploader.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Upload failures. On the server side these become JSON error responses.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request or the local file cannot be uploaded as given.
    #[error("invalid upload: {0}")]
    BadRequest(String),

    /// The server answered with a non-success status.
    #[error("server rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local file or writing an uploaded one failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else, such as a closed upload limiter.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            UploadError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            UploadError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        if status.is_server_error() {
            tracing::error!(code, error = %self, "upload failed");
        } else {
            tracing::debug!(code, error = %self, "upload rejected");
        }

        let body = json!({
            "result": "error",
            "code": code,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
