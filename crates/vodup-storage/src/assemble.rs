//! Chunk reassembly.
//!
//! Combines previously uploaded chunks for one file name into a single
//! object, then removes the chunk objects. Index order is authoritative: the
//! operation fetches `0..total_chunks` strictly in ascending order and never
//! reorders or deduplicates.

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use vodup_models::{chunk_key, format_bytes, CHUNK_KEY_MARKER};

use crate::error::{StorageError, StorageResult};
use crate::store::{ObjectEntry, ObjectStore};

/// Result of a successful reassembly.
#[derive(Debug, Clone)]
pub struct AssembledObject {
    /// Final object key (the plain file name).
    pub key: String,
    /// Publicly resolvable locator for the final object.
    pub url: String,
    /// Exact byte size, the sum of all fetched chunk lengths.
    pub size: u64,
    /// Chunk keys that could not be deleted after the final write.
    /// Non-fatal; the assembled object is durable regardless.
    pub cleanup_errors: Vec<String>,
}

/// Reassemble `total_chunks` chunks of `file_name` into one object.
///
/// All chunks are fetched before anything is written; the first failed fetch
/// aborts the operation naming the missing index, leaving every chunk object
/// in place so a retry of reassembly alone remains possible.
///
/// When `expected_sha256` is given, the hex-encoded SHA-256 of the
/// concatenation must match or the operation fails before the final write.
pub async fn assemble_chunks(
    store: &dyn ObjectStore,
    file_name: &str,
    total_chunks: u32,
    expected_sha256: Option<&str>,
) -> StorageResult<AssembledObject> {
    if total_chunks == 0 {
        return Err(StorageError::InvalidChunkCount(0));
    }

    info!("Reassembling {} chunks for {}", total_chunks, file_name);

    let mut chunks: Vec<Vec<u8>> = Vec::with_capacity(total_chunks as usize);
    for index in 0..total_chunks {
        let key = chunk_key(file_name, index);
        let bytes = store
            .get(&key)
            .await
            .map_err(|e| StorageError::chunk_missing(file_name, index, e.to_string()))?;
        chunks.push(bytes);
    }

    let total_size: u64 = chunks.iter().map(|c| c.len() as u64).sum();
    let mut combined = Vec::with_capacity(total_size as usize);
    for chunk in &chunks {
        combined.extend_from_slice(chunk);
    }

    if let Some(expected) = expected_sha256 {
        let actual = format!("{:x}", Sha256::digest(&combined));
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(StorageError::DigestMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }

    store
        .put(file_name, combined, "application/octet-stream")
        .await?;

    // Cleanup is best-effort. The final object is already durable, so a
    // failed delete is reported to the caller but never fails the operation.
    let mut cleanup_errors = Vec::new();
    for index in 0..total_chunks {
        let key = chunk_key(file_name, index);
        if let Err(e) = store.delete(std::slice::from_ref(&key)).await {
            warn!("Failed to delete chunk {}: {}", key, e);
            cleanup_errors.push(format!("{}: {}", key, e));
        }
    }

    info!(
        "Assembled {} ({}) from {} chunks",
        file_name,
        format_bytes(total_size),
        total_chunks
    );

    Ok(AssembledObject {
        key: file_name.to_string(),
        url: store.public_url(file_name),
        size: total_size,
        cleanup_errors,
    })
}

/// List chunk objects currently in the store.
///
/// Covers both in-flight uploads and orphans left behind by aborted ones;
/// there is no automated sweep, so operators watch this instead.
pub async fn list_chunk_objects(store: &dyn ObjectStore) -> StorageResult<Vec<ObjectEntry>> {
    let objects = store.list("").await?;
    Ok(objects
        .into_iter()
        .filter(|o| o.key.contains(CHUNK_KEY_MARKER))
        .collect())
}
