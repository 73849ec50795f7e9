//! User entity and repository traits.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Smallest tag handed out to a new user.
pub const MIN_TAG: i16 = 1;

/// Largest tag handed out to a new user.
pub const MAX_TAG: i16 = 9999;

/// Represents a user account in the chat system.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - username: VARCHAR(32) NOT NULL
/// - tag: SMALLINT NOT NULL, unique together with username
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Username (2-32 characters, not unique on its own)
    pub username: String,

    /// Discriminator that lets several users share a username
    pub tag: i16,

    /// Email address (unique, used to log in)
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Deactivated accounts keep their data but cannot log in
    pub is_active: bool,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new active account stamped with the current time.
    pub fn new(id: i64, username: String, tag: i16, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            tag,
            email,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The canonical id string carried inside authentication tokens.
    pub fn token_subject(&self) -> String {
        self.id.to_string()
    }

    /// `username#0042` form shown to other users.
    pub fn handle(&self) -> String {
        format!("{}#{:04}", self.username, self.tag)
    }
}

/// Parse the id string decoded from a token.
///
/// Only plain ASCII digits are accepted; anything else cannot name a user.
pub fn parse_user_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Normalize an email address by lowercasing the domain part.
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.trim().to_string(),
    }
}

/// Why a new user could not be stored.
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    /// Another account already uses the email address
    #[error("This email is already in use.")]
    EmailTaken,

    /// Another account already holds the same username and tag
    #[error("Username and tag are already taken.")]
    HandleTaken,

    #[error(transparent)]
    Store(#[from] AppError),
}

/// Resolves the user id carried by a token to the stored account.
///
/// Token verification only needs read access to `id`, `email` and
/// `password_hash`; a missing account is `Ok(None)`, a store failure is `Err`.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_for_token(&self, user_id: &str) -> Result<Option<User>, AppError>;
}

/// Repository trait for User data access operations.
///
/// Implementations of this trait handle the actual database interactions.
/// The trait is defined in the domain layer to maintain dependency inversion.
#[async_trait]
pub trait UserRepository: UserLookup {
    /// Find a user by their Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Check if an email address is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Tags already taken by users sharing `username`.
    async fn tags_for_username(&self, username: &str) -> Result<Vec<i16>, AppError>;

    /// Create a new user; email and `(username, tag)` are both unique.
    async fn create(&self, user: &User) -> Result<User, CreateUserError>;

    /// Replace the stored password hash.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AppError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}
