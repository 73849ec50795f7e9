//! In-Memory User Repository
//!
//! Process-local user store used when no database URL is configured, and
//! by the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{parse_user_id, CreateUserError, User, UserLookup, UserRepository};
use crate::shared::error::AppError;

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<i64, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserRepository {
    async fn find_for_token(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match parse_user_id(user_id) {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.users.read().values().any(|u| u.email == email))
    }

    async fn tags_for_username(&self, username: &str) -> Result<Vec<i16>, AppError> {
        Ok(self
            .users
            .read()
            .values()
            .filter(|u| u.username == username)
            .map(|u| u.tag)
            .collect())
    }

    async fn create(&self, user: &User) -> Result<User, CreateUserError> {
        let mut users = self.users.write();

        if users.values().any(|u| u.email == user.email) {
            return Err(CreateUserError::EmailTaken);
        }
        if users
            .values()
            .any(|u| u.username == user.username && u.tag == user.tag)
        {
            return Err(CreateUserError::HandleTaken);
        }
        if users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!("User {} already exists", user.id)).into());
        }

        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
