//! Health Check API Tests

use axum::http::StatusCode;

use crate::common::{failing_router, send, TestApp};

/// Test basic health check endpoint returns status and version
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert!(response.body["version"].is_string());
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new();

    let response = app.get("/health/live", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "alive");
}

/// Test readiness probe with a reachable user store
#[tokio::test]
async fn test_readiness_probe_healthy() {
    let app = TestApp::new();

    let response = app.get("/health/ready", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_ne!(response.body["status"], "unhealthy");
    assert!(response.body["checks"]["user_store"].is_object());
}

/// Test readiness probe reports 503 when the user store is down
#[tokio::test]
async fn test_readiness_probe_unhealthy() {
    let router = failing_router();
    let request = axum::http::Request::get("/health/ready")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&router, request).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "unhealthy");
}

/// Test metrics endpoint exposes authentication counters
#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();
    app.get("/api/v1/users/@me", None).await;

    let response = app.get("/metrics", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap_or_default();
    assert!(text.contains("siege_auth_outcomes_total"));
}
