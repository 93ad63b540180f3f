//! HTTP client for the upload endpoints.

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{UploadError, UploadResult};

/// Success response of the chunk upload endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadResponse {
    pub success: bool,
    pub chunk_index: u32,
    pub total_chunks: u32,
    /// Storage key the chunk was written under.
    pub chunk_file_name: String,
}

/// Success response of the reassembly endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub success: bool,
    pub file_name: String,
    /// Public locator for the assembled object.
    pub url: String,
    pub size: u64,
    #[serde(default)]
    pub cleanup_errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Typed client for the two upload endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload one chunk as a multipart form.
    pub async fn upload_chunk(
        &self,
        file_name: &str,
        chunk_index: u32,
        total_chunks: u32,
        bytes: Vec<u8>,
    ) -> UploadResult<ChunkUploadResponse> {
        debug!(
            "Uploading chunk {}/{} of {} ({} bytes)",
            chunk_index + 1,
            total_chunks,
            file_name,
            bytes.len()
        );

        let part = Part::bytes(bytes)
            .file_name("blob")
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("chunk", part)
            .text("fileName", file_name.to_string())
            .text("chunkIndex", chunk_index.to_string())
            .text("totalChunks", total_chunks.to_string());

        let response = self
            .http
            .post(format!("{}/api/uploads/chunk", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Request reassembly of all previously uploaded chunks.
    pub async fn complete(
        &self,
        file_name: &str,
        total_chunks: u32,
        sha256: Option<&str>,
    ) -> UploadResult<CompleteResponse> {
        debug!("Requesting reassembly of {} ({} chunks)", file_name, total_chunks);

        let mut body = json!({
            "fileName": file_name,
            "totalChunks": total_chunks,
        });
        if let Some(digest) = sha256 {
            body["sha256"] = json!(digest);
        }

        let response = self
            .http
            .post(format!("{}/api/uploads/complete", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> UploadResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => match body.details {
                Some(details) => format!("{}: {}", body.error, details),
                None => body.error,
            },
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };

        Err(UploadError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
