//! Authentication Service
//!
//! Account registration, email/password login and password changes. Every
//! operation that establishes credentials answers with the account's token.

use std::collections::HashSet;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use rand::seq::IndexedRandom;

use crate::domain::{
    normalize_email, CreateUserError, TokenCodec, User, UserRepository, MAX_TAG, MIN_TAG,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and return it with its token.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AccountError>;

    /// Exchange email and password for the account's token.
    async fn login(&self, email: &str, password: &str) -> Result<(User, String), AccountError>;

    /// Replace the password of `user`; tokens issued before stop verifying.
    async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(User, String), AccountError>;
}

/// Account operation errors
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("This email is already in use.")]
    EmailInUse,

    #[error("No available tags.")]
    NoAvailableTags,

    #[error("Unable to login with provided credentials.")]
    InvalidLogin,

    #[error("Invalid password.")]
    IncorrectPassword,

    #[error("User not found.")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailInUse => AppError::Conflict(err.to_string()),
            AccountError::NoAvailableTags => AppError::field("username", &err.to_string()),
            AccountError::InvalidLogin => AppError::Forbidden(err.to_string()),
            AccountError::IncorrectPassword => {
                AppError::field("current_password", &err.to_string())
            }
            AccountError::NotFound => AppError::NotFound(err.to_string()),
            AccountError::Hashing(msg) => AppError::Internal(msg),
            AccountError::Store(e) => e,
        }
    }
}

/// Registrations retried after another account took the picked tag first
const TAG_ATTEMPTS: usize = 3;

/// Pick a random tag not in `used`, or `None` when every tag is taken.
pub fn pick_tag(used: &[i16]) -> Option<i16> {
    let used: HashSet<i16> = used.iter().copied().collect();
    let available: Vec<i16> = (MIN_TAG..=MAX_TAG).filter(|t| !used.contains(t)).collect();

    available.choose(&mut rand::rng()).copied()
}

/// Hash a password using Argon2id on the blocking pool
async fn hash_password(password: &str) -> Result<String, AccountError> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AccountError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AccountError::Hashing(e.to_string()))?
}

/// Verify a password against its hash on the blocking pool
async fn verify_password(password: &str, hash: &str) -> Result<bool, AccountError> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    tokio::task::spawn_blocking(move || -> Result<bool, AccountError> {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|e| AccountError::Hashing(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AccountError::Hashing(e.to_string()))?
}

/// AuthService implementation
pub struct AuthServiceImpl<U: ?Sized> {
    user_repo: Arc<U>,
    codec: TokenCodec,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<U> AuthServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    /// Create a new AuthServiceImpl
    pub fn new(user_repo: Arc<U>, codec: TokenCodec, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            user_repo,
            codec,
            id_generator,
        }
    }
}

#[async_trait]
impl<U> AuthService for AuthServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AccountError> {
        let email = normalize_email(email);

        if self.user_repo.email_exists(&email).await? {
            return Err(AccountError::EmailInUse);
        }

        let password_hash = hash_password(password).await?;

        for _ in 0..TAG_ATTEMPTS {
            let used = self.user_repo.tags_for_username(username).await?;
            let tag = pick_tag(&used).ok_or(AccountError::NoAvailableTags)?;

            let user = User::new(
                self.id_generator.generate(),
                username.to_string(),
                tag,
                email.clone(),
                password_hash.clone(),
            );

            match self.user_repo.create(&user).await {
                Ok(created) => {
                    tracing::info!(
                        user_id = created.id,
                        handle = %created.handle(),
                        "User registered"
                    );

                    let token = self.codec.token_for(&created);
                    return Ok((created, token));
                }
                Err(CreateUserError::HandleTaken) => {
                    tracing::debug!(username = %username, tag, "Tag taken, picking another");
                }
                Err(CreateUserError::EmailTaken) => return Err(AccountError::EmailInUse),
                Err(CreateUserError::Store(e)) => return Err(e.into()),
            }
        }

        Err(AccountError::NoAvailableTags)
    }

    async fn login(&self, email: &str, password: &str) -> Result<(User, String), AccountError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AccountError::InvalidLogin)?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(AccountError::InvalidLogin);
        }

        if !user.is_active {
            tracing::debug!(user_id = user.id, "Login rejected: inactive account");
            return Err(AccountError::InvalidLogin);
        }

        let token = self.codec.token_for(&user);
        Ok((user, token))
    }

    async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(User, String), AccountError> {
        if !verify_password(current_password, &user.password_hash).await? {
            return Err(AccountError::IncorrectPassword);
        }

        let password_hash = hash_password(new_password).await?;
        let updated = match self.user_repo.update_password(user.id, &password_hash).await {
            Ok(updated) => updated,
            Err(AppError::NotFound(_)) => return Err(AccountError::NotFound),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = updated.id, "Password changed");

        let token = self.codec.token_for(&updated);
        Ok((updated, token))
    }
}
