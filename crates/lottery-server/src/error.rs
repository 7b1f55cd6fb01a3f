//! Error types for the intake service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use submission_store::StoreError;
use thiserror::Error;

/// Intake pipeline errors.
///
/// Client input errors surface their message; storage and render failures
/// surface an opaque message with full detail logged server-side.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("No files uploaded")]
    NoFilesUploaded,

    #[error("{0}")]
    InvalidSubmission(String),

    #[error("Failed to save submission.")]
    Storage(#[from] StoreError),

    #[error("Failed to save PDF.")]
    Receipt(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = match &self {
            IntakeError::NoFilesUploaded | IntakeError::InvalidSubmission(_) => {
                StatusCode::BAD_REQUEST
            }
            IntakeError::Storage(_) | IntakeError::Receipt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Submission pipeline failure");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for IntakeError {
    fn from(e: std::io::Error) -> Self {
        IntakeError::Storage(StoreError::Io(e))
    }
}
