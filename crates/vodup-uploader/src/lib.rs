//! Client side of the chunked upload pipeline.
//!
//! This crate provides:
//! - [`ChunkSplitter`]: fixed-size chunking over a source file
//! - [`UploadState`]: the explicit upload state machine
//! - [`ApiClient`]: HTTP client for the two upload endpoints
//! - [`Uploader`]: the sequential driver tying the three together

pub mod client;
pub mod error;
pub mod splitter;
pub mod state;
pub mod uploader;

pub use client::{ApiClient, ChunkUploadResponse, CompleteResponse};
pub use error::{StateError, UploadError, UploadResult};
pub use splitter::ChunkSplitter;
pub use state::{UploadPhase, UploadState};
pub use uploader::{CompletedUpload, Uploader};
