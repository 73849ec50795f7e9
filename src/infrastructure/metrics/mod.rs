//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - Authentication gate outcomes per request
//! - Login attempts by result
//! - HTTP request counts and latency

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Gate outcomes: authenticated, anonymous, rejected, rate_limited, error
pub static AUTH_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("auth_outcomes_total", "Authentication gate outcomes").namespace("siege"),
        &["outcome"],
    )
    .expect("Failed to create AUTH_OUTCOMES_TOTAL metric")
});

/// Login attempts: success, rejected
pub static LOGIN_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("login_attempts_total", "Email/password login attempts").namespace("siege"),
        &["result"],
    )
    .expect("Failed to create LOGIN_ATTEMPTS_TOTAL metric")
});

/// HTTP request counter by method, matched route and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace("siege"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace("siege")
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(AUTH_OUTCOMES_TOTAL.clone()))
        .expect("Failed to register AUTH_OUTCOMES_TOTAL");
    registry
        .register(Box::new(LOGIN_ATTEMPTS_TOTAL.clone()))
        .expect("Failed to register LOGIN_ATTEMPTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}

/// Count one authentication gate outcome.
pub fn record_auth_outcome(outcome: &str) {
    AUTH_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Count one login attempt.
pub fn record_login_attempt(success: bool) {
    let result = if success { "success" } else { "rejected" };
    LOGIN_ATTEMPTS_TOTAL.with_label_values(&[result]).inc();
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}
