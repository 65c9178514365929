//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "scenespot_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "scenespot_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "scenespot_http_requests_in_flight";

    // Indexing metrics
    pub const INDEX_CACHE_HITS_TOTAL: &str = "scenespot_index_cache_hits_total";
    pub const INDEX_CACHE_MISSES_TOTAL: &str = "scenespot_index_cache_misses_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "scenespot_analysis_duration_seconds";

    // Query metrics
    pub const QUERIES_TOTAL: &str = "scenespot_queries_total";

    // Notification metrics
    pub const NOTIFICATIONS_TOTAL: &str = "scenespot_notifications_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an upload that was served from an existing artifact.
pub fn record_index_cache_hit() {
    counter!(names::INDEX_CACHE_HITS_TOTAL).increment(1);
}

/// Record an upload that needed a fresh analysis.
pub fn record_index_cache_miss() {
    counter!(names::INDEX_CACHE_MISSES_TOTAL).increment(1);
}

/// Record one analysis round trip (upload, polling, generation).
pub fn record_analysis_duration(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a query by outcome (`answered`, `index_missing`, `error`).
pub fn record_query(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::QUERIES_TOTAL, &labels).increment(1);
}

/// Record a notification attempt by outcome (`sent`, `failed`, `dropped`).
pub fn record_notification(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::NOTIFICATIONS_TOTAL, &labels).increment(1);
}

/// Map a request path onto a bounded label set.
fn path_label(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/player" => "/player",
        "/api/upload" => "/api/upload",
        "/api/ask" => "/api/ask",
        "/health" | "/healthz" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
