//! End-to-end tests for the chunked upload endpoints.
//!
//! Run against the real router with the in-memory store, so every request
//! goes through the full middleware and handler stack.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use vodup_api::{create_router, ApiConfig, AppState};
use vodup_storage::{MemoryStore, ObjectStore};

const BOUNDARY: &str = "vodup-test-boundary";

fn test_app() -> (axum::Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(ApiConfig::default(), store.clone());
    (create_router(state, None), store)
}

/// Build a multipart body for the chunk endpoint. Integer fields are passed
/// as strings so malformed values can be exercised too.
fn multipart_chunk_body(fields: &[(&str, &str)], chunk: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = chunk {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"chunk\"; filename=\"blob\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn chunk_request(file_name: &str, chunk_index: u32, total_chunks: u32, bytes: &[u8]) -> Request<Body> {
    let body = multipart_chunk_body(
        &[
            ("fileName", file_name),
            ("chunkIndex", &chunk_index.to_string()),
            ("totalChunks", &total_chunks.to_string()),
        ],
        Some(bytes),
    );
    Request::builder()
        .method("POST")
        .uri("/api/uploads/chunk")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn complete_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/uploads/complete")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_and_reassemble_roundtrip() {
    // Three chunks sized 4+4+2, reassembled byte-for-byte.
    let (app, store) = test_app();
    let parts: [&[u8]; 3] = [b"AAAA", b"BBBB", b"CC"];

    for (i, part) in parts.iter().enumerate() {
        let response = app
            .clone()
            .oneshot(chunk_request("1700-video.mp4", i as u32, 3, part))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["chunkIndex"], json!(i));
        assert_eq!(body["totalChunks"], json!(3));
        assert_eq!(
            body["chunkFileName"],
            json!(format!("1700-video.mp4.chunk.{}", i))
        );
    }

    let response = app
        .oneshot(complete_request(
            json!({ "fileName": "1700-video.mp4", "totalChunks": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["fileName"], json!("1700-video.mp4"));
    assert_eq!(body["size"], json!(10));
    assert_eq!(body["url"], json!("memory://1700-video.mp4"));
    assert_eq!(body["cleanupErrors"], json!([]));

    // Final object holds the exact concatenation; chunks are gone.
    assert_eq!(store.get("1700-video.mp4").await.unwrap(), b"AAAABBBBCC");
    assert!(!store.exists("1700-video.mp4.chunk.0").await.unwrap());
    assert!(!store.exists("1700-video.mp4.chunk.1").await.unwrap());
    assert!(!store.exists("1700-video.mp4.chunk.2").await.unwrap());
}

#[tokio::test]
async fn test_missing_chunk_fails_and_writes_nothing() {
    // totalChunks=3 with only two chunks present: the failure names the
    // missing index and no final object appears.
    let (app, store) = test_app();

    for i in 0..2u32 {
        let response = app
            .clone()
            .oneshot(chunk_request("f.bin", i, 3, b"data"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(complete_request(
            json!({ "fileName": "f.bin", "totalChunks": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Failed to download chunk"));
    assert!(body["details"].as_str().unwrap().contains("Chunk 2"));

    assert!(!store.exists("f.bin").await.unwrap());
    assert!(store.exists("f.bin.chunk.0").await.unwrap());
    assert!(store.exists("f.bin.chunk.1").await.unwrap());
}

#[tokio::test]
async fn test_chunk_reupload_last_write_wins() {
    // Chunk 0 uploaded twice with different payloads; the second wins.
    let (app, store) = test_app();

    for payload in [&b"first!"[..], &b"second"[..]] {
        let response = app
            .clone()
            .oneshot(chunk_request("abc", 0, 2, payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .clone()
        .oneshot(chunk_request("abc", 1, 2, b"-tail"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(complete_request(
            json!({ "fileName": "abc", "totalChunks": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.get("abc").await.unwrap(), b"second-tail");
}

#[tokio::test]
async fn test_chunk_validation_rejected_before_store_access() {
    let (app, store) = test_app();

    // Missing chunk field
    let body = multipart_chunk_body(
        &[("fileName", "f"), ("chunkIndex", "0"), ("totalChunks", "1")],
        None,
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/uploads/chunk")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Validation failed"));
    assert!(body["details"].as_str().unwrap().contains("chunk"));

    // Non-integer index
    let response = app
        .clone()
        .oneshot({
            let body = multipart_chunk_body(
                &[
                    ("fileName", "f"),
                    ("chunkIndex", "zero"),
                    ("totalChunks", "1"),
                ],
                Some(b"x"),
            );
            Request::builder()
                .method("POST")
                .uri("/api/uploads/chunk")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap()
        })
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Index out of range
    let response = app
        .clone()
        .oneshot(chunk_request("f", 3, 3, b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Path traversal in file name
    let response = app
        .clone()
        .oneshot(chunk_request("../../etc/passwd", 0, 1, b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // File name colliding with the chunk key namespace
    let response = app
        .clone()
        .oneshot(chunk_request("f.chunk.0", 0, 1, b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No request reached the store.
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_complete_validation() {
    let (app, store) = test_app();

    // Missing totalChunks
    let response = app
        .clone()
        .oneshot(complete_request(json!({ "fileName": "f" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Validation failed"));

    // Zero chunks
    let response = app
        .clone()
        .oneshot(complete_request(
            json!({ "fileName": "f", "totalChunks": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_digest_mismatch_rejected() {
    let (app, store) = test_app();

    let response = app
        .clone()
        .oneshot(chunk_request("f", 0, 1, b"payload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(complete_request(json!({
            "fileName": "f",
            "totalChunks": 1,
            "sha256": "deadbeef"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Digest mismatch"));
    assert!(!store.exists("f").await.unwrap());
}

#[tokio::test]
async fn test_orphan_listing() {
    let (app, _store) = test_app();

    for (name, total) in [("a", 2), ("b", 1)] {
        let response = app
            .clone()
            .oneshot(chunk_request(name, 0, total, b"xxxx"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/uploads/orphans")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let chunks = body["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(body["totalBytes"], json!(8));
}

#[tokio::test]
async fn test_health_and_headers() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));

    let body = response_json(response).await;
    assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn test_ready_probe_uses_store() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], json!("ready"));
    assert_eq!(body["storage"]["status"], json!("ok"));
}
