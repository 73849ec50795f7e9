//! User Service
//!
//! Read access to user profiles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{User, UserRepository};

use super::auth_service::AccountError;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, user_id: i64) -> Result<UserDto, AccountError>;
}

/// Public view of a user, as shown to other users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub tag: i16,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            tag: user.tag,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl<U: ?Sized> {
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn get_user(&self, user_id: i64) -> Result<UserDto, AccountError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        Ok(UserDto::from(user))
    }
}
