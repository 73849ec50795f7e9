//! Health Check Handlers
//!
//! Provides health check endpoints for Kubernetes-style liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (can the user store be reached?)

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::domain::UserRepository;
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Store round trips slower than this report as degraded
const DEGRADED_LATENCY_MS: u64 = 100;

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

/// Individual dependency checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub user_store: ServiceHealth,
}

/// Health status for one dependency
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - checks if the server is running
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe - returns 200 if the user store answers, 503 otherwise
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let user_store = check_user_store(state.users.as_ref()).await;
    let status = user_store.status;

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks { user_store },
    };

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Check user store connectivity and latency
async fn check_user_store(users: &dyn UserRepository) -> ServiceHealth {
    let start = Instant::now();
    match users.ping().await {
        Ok(()) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: classify_latency(latency),
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "User store health check failed");
            ServiceHealth {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                message: Some("User store unavailable".to_string()),
            }
        }
    }
}

fn classify_latency(latency_ms: u64) -> HealthStatus {
    if latency_ms < DEGRADED_LATENCY_MS {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}
