//! Authentication Middleware
//!
//! Runs the authentication gate on every API request. A verified user is
//! inserted into the request extensions; anonymous requests pass through
//! untouched and are turned away later by handlers that need a user.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::{AuthError, Authentication};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::startup::AppState;

use super::rate_limit::create_rate_limit_response;

/// Authentication middleware that validates `Token` credentials
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // A header that is not visible ASCII cannot carry a token
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    // Credentialed requests hold a failure slot while they are verified
    let slot = match state.gate.extract_credential(header.as_deref()) {
        Some(_) => {
            let identifier = state.rate_limiter.client_identifier(&request);
            match state.rate_limiter.acquire(&identifier) {
                Ok(slot) => Some(slot),
                Err(info) => {
                    tracing::warn!(identifier = %identifier, "Too many rejected credentials");
                    metrics::record_auth_outcome("rate_limited");
                    return create_rate_limit_response(&info);
                }
            }
        }
        None => None,
    };

    let outcome = state.gate.authenticate(header.as_deref()).await;

    match outcome {
        Ok(Authentication::Authenticated(user)) => {
            drop(slot);
            metrics::record_auth_outcome("authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(Authentication::Unauthenticated) => {
            drop(slot);
            metrics::record_auth_outcome("anonymous");
            next.run(request).await
        }
        Err(AuthError::InvalidCredentials) => {
            metrics::record_auth_outcome("rejected");
            if let Some(slot) = slot {
                let info = slot.commit();
                tracing::debug!(remaining = info.remaining, "Rejected credential counted");
            }
            AppError::from(AuthError::InvalidCredentials).into_response()
        }
        Err(e) => {
            drop(slot);
            metrics::record_auth_outcome("error");
            AppError::from(e).into_response()
        }
    }
}
