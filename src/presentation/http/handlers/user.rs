//! User Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{ChangePasswordRequest, RegisterRequest};
use crate::application::dto::response::{
    CurrentUserResponse, RegisterResponse, TokenResponse, UserResponse,
};
use crate::domain::parse_user_id;
use crate::presentation::http::extractors::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate;
use crate::startup::AppState;

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    validate(&body)?;

    let (user, token) = state
        .auth_service
        .register(&body.username, &body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::new(&user, token))))
}

/// Get the authenticated user's own account
pub async fn get_current_user(AuthUser(auth): AuthUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse::new(auth.user, auth.token))
}

/// Get another user's public profile
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id =
        parse_user_id(&user_id).ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    let user = state.user_service.get_user(user_id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Change the authenticated user's password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate(&body)?;

    let (_, token) = state
        .auth_service
        .change_password(&auth.user, &body.current_password, &body.new_password)
        .await?;

    Ok(Json(TokenResponse { token }))
}
