//! Custom Extractors
//!
//! Axum extractors over the user the authentication middleware attached to
//! the request.

use std::convert::Infallible;
use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::domain::AuthenticatedUser;
use crate::shared::error::AppError;

/// Message for protected routes reached without a credential.
pub const CREDENTIALS_NOT_PROVIDED: &str = "Authentication credentials were not provided.";

/// Authenticated user; rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl Deref for AuthUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(CREDENTIALS_NOT_PROVIDED.into()))
    }
}

/// Authenticated user if there is one; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}
