//! Error types for collab-ia
//!
//! Every handler error renders as `{"error": {"code": ..., "message": ...}}`.
//! A failed stream read additionally carries the partial counts.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{IngestError, UploadRejection};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body over the configured limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Upload refused before ingestion started
    #[error(transparent)]
    Upload(#[from] UploadRejection),

    /// Ingestion aborted by a read failure (422)
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// collab-common error (500)
    #[error("Common error: {0}")]
    Common(#[from] collab_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::Upload(UploadRejection::MissingFile) => (StatusCode::BAD_REQUEST, "NO_FILE"),
            ApiError::Upload(UploadRejection::UnsupportedFileType { .. }) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE_TYPE")
            }
            ApiError::Upload(UploadRejection::TooLarge { .. }) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
            }
            ApiError::Ingest(IngestError::StreamReadFailed { partial, .. }) => {
                let body = Json(json!({
                    "error": {
                        "code": "STREAM_READ_FAILED",
                        "message": message,
                    },
                    "message": partial.message,
                    "processedRows": partial.processed_rows,
                    "rowsWithError": partial.rows_with_error,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
