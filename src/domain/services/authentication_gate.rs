//! Authentication Gate
//!
//! Turns the raw `Authorization` header value of a request into an
//! authenticated user, an anonymous request, or a rejected credential.
//!
//! Only `Authorization: Token <token>` is recognised. A header of any other
//! shape is treated exactly like a missing header so that endpoints open to
//! anonymous users keep working; a header of the right shape carrying a bad
//! token is an explicit failure.

use std::sync::Arc;

use crate::domain::{User, UserLookup};
use crate::shared::error::AppError;

use super::token_codec::{TokenCodec, TokenError};

/// Scheme word expected before the token, compared case-sensitively.
pub const TOKEN_SCHEME: &str = "Token";

/// A request whose credential verified.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    /// The token as presented, for handlers that echo it back
    pub token: String,
}

/// Result of inspecting a request's credential.
#[derive(Debug, Clone)]
pub enum Authentication {
    Authenticated(AuthenticatedUser),
    /// No credential in the expected shape; the request is anonymous
    Unauthenticated,
}

impl Authentication {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated => None,
        }
    }
}

/// Gate failures. Anonymous requests are not failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token.")]
    InvalidCredentials,

    #[error("User lookup failed: {0}")]
    Lookup(#[source] AppError),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed | TokenError::UnsupportedVersion(_) => Self::InvalidCredentials,
            TokenError::Lookup(e) => Self::Lookup(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid token.".into()),
            AuthError::Lookup(e) => e,
        }
    }
}

/// Request-boundary adapter over [`TokenCodec`] and a user lookup.
pub struct AuthenticationGate<L: ?Sized> {
    codec: TokenCodec,
    users: Arc<L>,
}

impl<L> AuthenticationGate<L>
where
    L: UserLookup + ?Sized,
{
    pub fn new(codec: TokenCodec, users: Arc<L>) -> Self {
        Self { codec, users }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Value for the `WWW-Authenticate` header of a 401 response.
    pub fn challenge(&self) -> &'static str {
        TOKEN_SCHEME
    }

    /// Pull the token out of a header value of the form `Token <token>`.
    ///
    /// Returns `None` for a missing header, a header that does not split into
    /// exactly two whitespace-separated words, or a different scheme word.
    pub fn extract_credential<'a>(&self, header: Option<&'a str>) -> Option<&'a str> {
        let mut words = header?.split_ascii_whitespace();

        let (Some(scheme), Some(token), None) = (words.next(), words.next(), words.next()) else {
            return None;
        };

        (scheme == TOKEN_SCHEME).then_some(token)
    }

    /// Authenticate a request from its raw `Authorization` header value.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Authentication, AuthError> {
        let Some(token) = self.extract_credential(header) else {
            return Ok(Authentication::Unauthenticated);
        };

        match self.codec.verify(token, self.users.as_ref()).await {
            Ok(verified) => {
                tracing::debug!(user_id = verified.user.id, "Token authenticated");
                Ok(Authentication::Authenticated(AuthenticatedUser {
                    user: verified.user,
                    token: verified.token,
                }))
            }
            Err(TokenError::Lookup(e)) => {
                tracing::error!(error = %e, "User lookup failed during token verification");
                Err(AuthError::Lookup(e))
            }
            Err(e) => {
                tracing::debug!("Token rejected");
                Err(e.into())
            }
        }
    }
}
