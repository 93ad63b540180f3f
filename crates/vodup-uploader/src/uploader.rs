//! Sequential upload driver.
//!
//! Drives the whole pipeline from the client side: split, upload chunks
//! strictly in index order with one request in flight at a time, then issue
//! exactly one reassembly call once every chunk upload has succeeded.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use vodup_models::CHUNK_SIZE;

use crate::client::ApiClient;
use crate::error::{UploadError, UploadResult};
use crate::splitter::ChunkSplitter;
use crate::state::UploadState;

/// Progress callback, invoked with `(chunkIndex + 1) / totalChunks` after
/// each chunk completes.
pub type ProgressFn = dyn Fn(f64) + Send + Sync;

/// Outcome of a finished upload.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    /// Final object key (the derived upload file name).
    pub file_name: String,
    /// Public locator for the assembled object.
    pub url: String,
    /// Assembled size in bytes.
    pub size: u64,
    pub total_chunks: u32,
    /// Chunk objects the server failed to clean up (non-fatal).
    pub cleanup_errors: Vec<String>,
}

/// Sequential upload driver.
pub struct Uploader {
    api: ApiClient,
    chunk_size: usize,
    send_digest: bool,
    progress: Option<Box<ProgressFn>>,
}

impl Uploader {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            chunk_size: CHUNK_SIZE,
            send_digest: true,
            progress: None,
        }
    }

    /// Override the chunk size. Must not exceed the server's body limit.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Disable the client-side SHA-256 sent with the reassembly request.
    pub fn without_digest(mut self) -> Self {
        self.send_digest = false;
        self
    }

    /// Register a progress callback.
    pub fn on_progress(mut self, f: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    fn report_progress(&self, fraction: f64) {
        if let Some(f) = &self.progress {
            f(fraction);
        }
    }

    /// Upload `path` through the chunked pipeline.
    ///
    /// Any chunk failure aborts the remaining sequence; there is no resume.
    /// A restart derives a fresh file name, so nothing from the aborted
    /// attempt can leak into the next one.
    pub async fn upload(&self, path: impl AsRef<Path>) -> UploadResult<CompletedUpload> {
        let path = path.as_ref();
        let mut state = UploadState::new();
        state.begin_splitting()?;

        let mut splitter = match ChunkSplitter::open(path, self.chunk_size).await {
            Ok(s) => s,
            Err(e) => {
                state.fail(e.to_string())?;
                return Err(e);
            }
        };
        let descriptor = splitter.descriptor().clone();
        state.begin_uploading(descriptor.total_chunks)?;

        info!(
            "Uploading {} as {} ({} chunks)",
            path.display(),
            descriptor.file_name,
            descriptor.total_chunks
        );

        let mut hasher = Sha256::new();
        for chunk_index in 0..descriptor.total_chunks {
            let bytes = match splitter.read_chunk(chunk_index).await {
                Ok(b) => b,
                Err(e) => {
                    state.fail(e.to_string())?;
                    return Err(e);
                }
            };
            hasher.update(&bytes);

            if let Err(e) = self
                .api
                .upload_chunk(
                    &descriptor.file_name,
                    chunk_index,
                    descriptor.total_chunks,
                    bytes,
                )
                .await
            {
                warn!("Chunk {} failed, aborting upload: {}", chunk_index, e);
                state.fail(e.to_string())?;
                return Err(e);
            }

            state.chunk_completed()?;
            self.report_progress((chunk_index + 1) as f64 / descriptor.total_chunks as f64);
        }

        let digest = format!("{:x}", hasher.finalize());
        let sha256 = self.send_digest.then_some(digest.as_str());

        let response = match self
            .api
            .complete(&descriptor.file_name, descriptor.total_chunks, sha256)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                state.fail(e.to_string())?;
                return Err(e);
            }
        };
        state.assembled()?;

        if !response.cleanup_errors.is_empty() {
            warn!(
                "Server reported {} chunk cleanup failures for {}",
                response.cleanup_errors.len(),
                response.file_name
            );
        }
        info!("Upload complete: {} ({} bytes)", response.url, response.size);

        Ok(CompletedUpload {
            file_name: response.file_name,
            url: response.url,
            size: response.size,
            total_chunks: descriptor.total_chunks,
            cleanup_errors: response.cleanup_errors,
        })
    }
}
