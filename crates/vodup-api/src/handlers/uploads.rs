//! Chunked upload handlers.
//!
//! Two endpoints drive the pipeline: one persists a single chunk under its
//! derived key, the other reassembles all chunks of a file name into the
//! final object. The server holds no upload session; the only state is the
//! chunk objects themselves.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vodup_models::{chunk_key, format_bytes, validate_file_name};
use vodup_storage::{assemble_chunks, list_chunk_objects, ObjectEntry};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Success response of the chunk upload endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadResponse {
    pub success: bool,
    pub chunk_index: u32,
    pub total_chunks: u32,
    /// Storage key the chunk was written under.
    pub chunk_file_name: String,
}

/// Parse a string-encoded integer form field.
fn parse_index_field(name: &str, value: &str) -> ApiResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("field '{}' is not a valid integer", name)))
}

/// Validate the upload coordinates shared by both endpoints.
///
/// Client-supplied, so treated as untrusted: the file name must be path-safe
/// and the index must lie inside `[0, totalChunks)`.
fn validate_coordinates(file_name: &str, chunk_index: Option<u32>, total_chunks: u32) -> ApiResult<()> {
    validate_file_name(file_name).map_err(|e| ApiError::validation(e.to_string()))?;
    if total_chunks < 1 {
        return Err(ApiError::validation("totalChunks must be at least 1"));
    }
    if let Some(index) = chunk_index {
        if index >= total_chunks {
            return Err(ApiError::validation(format!(
                "chunkIndex {} out of range for totalChunks {}",
                index, total_chunks
            )));
        }
    }
    Ok(())
}

/// `POST /api/uploads/chunk` — persist one chunk's bytes.
///
/// Multipart form fields: `chunk` (binary), `fileName`, `chunkIndex`,
/// `totalChunks`. Re-uploading the same index is safe and replaces the prior
/// bytes. Nothing is written until every field has validated.
pub async fn upload_chunk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ChunkUploadResponse>> {
    let mut chunk: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut chunk_index: Option<u32> = None;
    let mut total_chunks: Option<u32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "chunk" => {
                chunk = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("failed to read chunk: {}", e)))?,
                );
            }
            "fileName" => file_name = Some(field.text().await.map_err(bad_field)?),
            "chunkIndex" => {
                chunk_index = Some(parse_index_field(
                    "chunkIndex",
                    &field.text().await.map_err(bad_field)?,
                )?)
            }
            "totalChunks" => {
                total_chunks = Some(parse_index_field(
                    "totalChunks",
                    &field.text().await.map_err(bad_field)?,
                )?)
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    let chunk = chunk.ok_or_else(|| ApiError::validation("missing field 'chunk'"))?;
    let file_name = file_name.ok_or_else(|| ApiError::validation("missing field 'fileName'"))?;
    let chunk_index =
        chunk_index.ok_or_else(|| ApiError::validation("missing field 'chunkIndex'"))?;
    let total_chunks =
        total_chunks.ok_or_else(|| ApiError::validation("missing field 'totalChunks'"))?;

    validate_coordinates(&file_name, Some(chunk_index), total_chunks)?;

    let key = chunk_key(&file_name, chunk_index);
    info!(
        "Storing chunk {}/{} for {} ({} bytes)",
        chunk_index + 1,
        total_chunks,
        file_name,
        chunk.len()
    );

    let size = chunk.len() as u64;
    state
        .storage
        .put(&key, chunk.to_vec(), "application/octet-stream")
        .await?;
    metrics::record_chunk_uploaded(size);

    Ok(Json(ChunkUploadResponse {
        success: true,
        chunk_index,
        total_chunks,
        chunk_file_name: key,
    }))
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("failed to read form field: {}", e))
}

/// Reassembly request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub file_name: String,
    pub total_chunks: u32,
    /// Optional hex-encoded SHA-256 of the whole file, computed client-side.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Success response of the reassembly endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadResponse {
    pub success: bool,
    pub file_name: String,
    /// Public locator for the assembled object.
    pub url: String,
    pub size: u64,
    /// Chunk keys that could not be deleted after the final write.
    pub cleanup_errors: Vec<String>,
}

/// `POST /api/uploads/complete` — reassemble all chunks into one object.
///
/// The body is parsed by hand so a missing field comes back in the same
/// `{ error, details }` shape as every other validation failure.
pub async fn complete_upload(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<CompleteUploadResponse>> {
    let request: CompleteUploadRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation(format!("invalid request body: {}", e)))?;

    validate_coordinates(&request.file_name, None, request.total_chunks)?;

    let start = std::time::Instant::now();
    let assembled = match assemble_chunks(
        state.storage.as_ref(),
        &request.file_name,
        request.total_chunks,
        request.sha256.as_deref(),
    )
    .await
    {
        Ok(a) => a,
        Err(e) => {
            metrics::record_assembly_failure();
            return Err(e.into());
        }
    };

    metrics::record_assembly(
        request.total_chunks,
        start.elapsed().as_secs_f64(),
        assembled.cleanup_errors.len(),
    );
    info!(
        "Upload complete: {} ({})",
        assembled.key,
        format_bytes(assembled.size)
    );

    Ok(Json(CompleteUploadResponse {
        success: true,
        file_name: assembled.key,
        url: assembled.url,
        size: assembled.size,
        cleanup_errors: assembled.cleanup_errors,
    }))
}

/// Orphan listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanListResponse {
    pub chunks: Vec<ObjectEntry>,
    pub total_bytes: u64,
}

/// `GET /api/uploads/orphans` — list chunk objects currently in the store.
///
/// Covers in-flight uploads as well as orphans from aborted ones; there is no
/// automated sweep, so this is the operator's window into accumulation.
pub async fn list_orphans(State(state): State<AppState>) -> ApiResult<Json<OrphanListResponse>> {
    let chunks = list_chunk_objects(state.storage.as_ref()).await?;
    let total_bytes = chunks.iter().map(|o| o.size).sum();

    Ok(Json(OrphanListResponse {
        chunks,
        total_bytes,
    }))
}
