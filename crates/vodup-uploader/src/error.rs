//! Uploader error types.

use thiserror::Error;

use crate::state::UploadPhase;

/// Result type for uploader operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while driving a chunked upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("Chunk size must be at least 1 byte")]
    InvalidChunkSize,

    #[error("Chunk {chunk_index} out of range (total {total_chunks})")]
    ChunkOutOfRange { chunk_index: u32, total_chunks: u32 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload state error: {0}")]
    State(#[from] StateError),
}

/// Illegal transition of the upload state machine.
#[derive(Debug, Error)]
#[error("invalid upload state transition from {from:?} on '{event}'")]
pub struct StateError {
    pub from: UploadPhase,
    pub event: &'static str,
}
