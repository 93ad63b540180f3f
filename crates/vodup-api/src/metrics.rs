//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vodup_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vodup_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vodup_http_requests_in_flight";

    // Upload pipeline metrics
    pub const CHUNKS_UPLOADED_TOTAL: &str = "vodup_chunks_uploaded_total";
    pub const CHUNK_BYTES_TOTAL: &str = "vodup_chunk_bytes_total";
    pub const ASSEMBLIES_TOTAL: &str = "vodup_assemblies_total";
    pub const ASSEMBLY_FAILURES_TOTAL: &str = "vodup_assembly_failures_total";
    pub const ASSEMBLY_DURATION_SECONDS: &str = "vodup_assembly_duration_seconds";
    pub const CLEANUP_FAILURES_TOTAL: &str = "vodup_cleanup_failures_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vodup_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one stored chunk.
pub fn record_chunk_uploaded(bytes: u64) {
    counter!(names::CHUNKS_UPLOADED_TOTAL).increment(1);
    counter!(names::CHUNK_BYTES_TOTAL).increment(bytes);
}

/// Record a completed reassembly.
pub fn record_assembly(total_chunks: u32, duration_secs: f64, cleanup_failures: usize) {
    let labels = [("chunks", total_chunks.to_string())];
    counter!(names::ASSEMBLIES_TOTAL, &labels).increment(1);
    histogram!(names::ASSEMBLY_DURATION_SECONDS).record(duration_secs);
    if cleanup_failures > 0 {
        counter!(names::CLEANUP_FAILURES_TOTAL).increment(cleanup_failures as u64);
    }
}

/// Record a failed reassembly.
pub fn record_assembly_failure() {
    counter!(names::ASSEMBLY_FAILURES_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
///
/// Route paths here are static (no embedded IDs), so they are used as labels
/// directly.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
