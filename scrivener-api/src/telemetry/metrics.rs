//! Prometheus Metrics Definitions
//!
//! Defines all Scrivener metrics with their labels and exposes the
//! /metrics endpoint for Prometheus scraping.

use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Generation latency buckets (seconds); model calls run from seconds to minutes
const GENERATION_LATENCY_BUCKETS: &[f64] =
    &[0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<ScrivenerMetrics>> = Lazy::new(ScrivenerMetrics::new);

/// Container for all Scrivener metrics.
#[derive(Clone)]
pub struct ScrivenerMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Generation counter - labels: kind, mode, status
    pub generations_total: CounterVec,

    /// Generation duration histogram - labels: kind, mode
    pub generation_duration_seconds: HistogramVec,

    /// SSE relays currently open
    pub active_streams: Gauge,
}

impl ScrivenerMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "scrivener_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "scrivener_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            generations_total: register_counter_vec!(
                "scrivener_generations_total",
                "Total number of outline and report generations",
                &["kind", "mode", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register generations_total: {}", e)))?,

            generation_duration_seconds: register_histogram_vec!(
                "scrivener_generation_duration_seconds",
                "Generation duration in seconds, model call included",
                &["kind", "mode"],
                GENERATION_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register generation_duration_seconds: {}", e)))?,

            active_streams: register_gauge!(
                "scrivener_active_streams",
                "Current number of open SSE generation streams"
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register active_streams: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a finished generation. `status` is "success" or a failure kind.
    pub fn record_generation(&self, kind: &str, mode: &str, status: &str, duration_secs: f64) {
        self.generations_total
            .with_label_values(&[kind, mode, status])
            .inc();
        self.generation_duration_seconds
            .with_label_values(&[kind, mode])
            .observe(duration_secs);
    }
}

/// Record a generation if the registry initialized.
pub fn record_generation(kind: &str, mode: &str, status: &str, elapsed: Duration) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_generation(kind, mode, status, elapsed.as_secs_f64());
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    if let Err(e) = METRICS.as_ref() {
        tracing::warn!(error = %e.message, "Scrivener metrics unavailable; exporting defaults only");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn metrics() -> Result<&'static ScrivenerMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = metrics()?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        assert!(!metrics.generations_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_http_request("POST", "/api/v1/outline", 200, 1.5);
        let count = metrics
            .http_requests_total
            .with_label_values(&["POST", "/api/v1/outline", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_generation() -> Result<(), String> {
        let metrics = metrics()?;
        record_generation("report", "stream", "timeout", Duration::from_secs(61));
        let count = metrics
            .generations_total
            .with_label_values(&["report", "stream", "timeout"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_active_streams_gauge_registered() -> Result<(), String> {
        let metrics = metrics()?;
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| e.to_string())?;
        assert!(String::from_utf8_lossy(&buffer).contains("scrivener_active_streams"));
        assert!(metrics.active_streams.get() >= 0.0);
        Ok(())
    }
}
