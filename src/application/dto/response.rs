//! Response DTOs
//!
//! Data structures for API response bodies. User ids are serialized as
//! strings so JavaScript clients do not lose precision on snowflakes.

use serde::Serialize;

use crate::application::services::UserDto;
use crate::domain::User;

/// Registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub tag: i16,
    pub token: String,
}

impl RegisterResponse {
    pub fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            tag: user.tag,
            token,
        }
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub username: String,
    pub token: String,
}

impl LoginResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            email: user.email,
            username: user.username,
            token,
        }
    }
}

/// Token issued after a credential change
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// The authenticated user's own account
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: String,
    pub username: String,
    pub tag: i16,
    pub email: String,
    pub created_at: String,
    pub token: String,
}

impl CurrentUserResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            tag: user.tag,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
            token,
        }
    }
}

/// Another user's public profile
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub tag: i16,
    pub created_at: String,
}

impl From<UserDto> for UserResponse {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            tag: dto.tag,
            created_at: dto.created_at,
        }
    }
}
