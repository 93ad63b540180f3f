//! Object storage layer for the vodup backend.
//!
//! This crate provides:
//! - An [`ObjectStore`] trait over key-addressed binary storage
//! - A Cloudflare R2 implementation (S3 API)
//! - An in-memory implementation for tests and local development
//! - Chunk reassembly (ordered fetch, concatenation, cleanup)

pub mod assemble;
pub mod client;
pub mod error;
pub mod store;

pub use assemble::{assemble_chunks, list_chunk_objects, AssembledObject};
pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use store::{MemoryStore, ObjectEntry, ObjectStore};
