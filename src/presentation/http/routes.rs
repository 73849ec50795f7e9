//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, logging};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(logging::track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
///
/// Every request passes the authentication gate. Anonymous requests reach
/// the handlers; those that need a user reject them.
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(handlers::auth::login))
}

/// User routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::user::register))
        .route("/@me", get(handlers::user::get_current_user))
        .route("/@me/password", put(handlers::user::change_password))
        .route("/{user_id}", get(handlers::user::get_user))
}
