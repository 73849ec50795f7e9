//! Authentication Handlers

use axum::{extract::State, Json};

use crate::application::dto::request::LoginRequest;
use crate::application::dto::response::LoginResponse;
use crate::application::services::AccountError;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::startup::AppState;

/// Exchange email and password for the account's token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate(&body)?;

    match state.auth_service.login(&body.email, &body.password).await {
        Ok((user, token)) => {
            metrics::record_login_attempt(true);
            Ok(Json(LoginResponse::new(user, token)))
        }
        Err(e @ AccountError::InvalidLogin) => {
            metrics::record_login_attempt(false);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
