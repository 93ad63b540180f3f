//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vodup_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(e) => match e {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::DigestMismatch { .. } | StorageError::InvalidChunkCount(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short error category plus the specific detail string.
    fn parts(&self) -> (&'static str, String) {
        match self {
            ApiError::Validation(msg) => ("Validation failed", msg.clone()),
            ApiError::BadRequest(msg) => ("Bad request", msg.clone()),
            ApiError::NotFound(msg) => ("Not found", msg.clone()),
            ApiError::Internal(msg) => ("Internal error", msg.clone()),
            ApiError::Storage(e) => match e {
                StorageError::ChunkMissing { .. } => ("Failed to download chunk", e.to_string()),
                StorageError::DigestMismatch { .. } => ("Digest mismatch", e.to_string()),
                StorageError::UploadFailed(_) => ("Chunk upload failed", e.to_string()),
                StorageError::NotFound(_) => ("Not found", e.to_string()),
                _ => ("Storage error", e.to_string()),
            },
        }
    }
}

/// Wire shape of every failure: `{ "error": ..., "details": ... }`.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = self.parts();

        // Don't expose internal error details in production. Chunk fetch
        // failures stay verbose: the failing index is part of the contract.
        let mask = status == StatusCode::INTERNAL_SERVER_ERROR
            && !matches!(self, ApiError::Storage(StorageError::ChunkMissing { .. }))
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production";
        let details = if mask {
            "An internal error occurred".to_string()
        } else {
            details
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
