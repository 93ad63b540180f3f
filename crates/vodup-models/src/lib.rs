//! Shared data models for the vodup backend.
//!
//! This crate provides the types every other crate agrees on:
//! - Chunk addressing (storage keys, split math)
//! - The client-held upload descriptor
//! - Upload file-name derivation and validation
//! - Byte formatting helpers

pub mod chunk;
pub mod file_name;
pub mod utils;

// Re-export common types
pub use chunk::{chunk_count, chunk_key, UploadDescriptor, CHUNK_KEY_MARKER, CHUNK_SIZE};
pub use file_name::{timestamped_file_name, validate_file_name, FileNameError, FileNameResult};
pub use utils::format_bytes;
