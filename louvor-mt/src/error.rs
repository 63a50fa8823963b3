//! Error types for louvor-mt

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::IngestError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., song id already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is not a member of the song's ministry (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// louvor-common error
    #[error("Common error: {0}")]
    Common(#[from] louvor_common::Error),

    /// Multitrack ingestion error
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => common_status(err),
            ApiError::Ingest(ref err) => ingest_status(err),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, %message, "Request failed");
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

fn common_status(err: &louvor_common::Error) -> (StatusCode, &'static str, String) {
    use louvor_common::Error;

    let (status, code) = match err {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        Error::DuplicateKey(_) => (StatusCode::CONFLICT, "CONFLICT"),
        Error::PermissionDenied(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
    };
    (status, code, err.to_string())
}

fn ingest_status(err: &IngestError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err {
        IngestError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_UPLOAD"),
        IngestError::ArchiveCorrupt(_) => (StatusCode::BAD_REQUEST, "ARCHIVE_CORRUPT"),
        IngestError::NoAudioFound => (StatusCode::BAD_REQUEST, "NO_AUDIO_FOUND"),
        IngestError::CopyFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "COPY_FAILURE"),
        IngestError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
    };
    (status, code, err.to_string())
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
