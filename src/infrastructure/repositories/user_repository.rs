//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Maps between the database schema and domain User entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{parse_user_id, CreateUserError, User, UserLookup, UserRepository};
use crate::shared::error::AppError;

const EMAIL_CONSTRAINT: &str = "users_email_key";
const HANDLE_CONSTRAINT: &str = "users_username_tag_key";

/// Database row representation matching the users table schema.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    tag: i16,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            tag: row.tag,
            email: row.email,
            password_hash: row.password_hash,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLookup for PgUserRepository {
    async fn find_for_token(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match parse_user_id(user_id) {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, tag, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, tag, email, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn tags_for_username(&self, username: &str) -> Result<Vec<i16>, AppError> {
        let tags: Vec<i16> = sqlx::query_scalar("SELECT tag FROM users WHERE username = $1")
            .bind(username)
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    async fn create(&self, user: &User) -> Result<User, CreateUserError> {
        let result = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, tag, email, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, username, tag, email, password_hash, is_active, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.tag)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(unique_violation(db.constraint()))
            }
            Err(e) => Err(AppError::from(e).into()),
        }
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, tag, email, password_hash, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

        Ok(row.into())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique violation on `users` to the constraint that was hit.
fn unique_violation(constraint: Option<&str>) -> CreateUserError {
    match constraint {
        Some(EMAIL_CONSTRAINT) => CreateUserError::EmailTaken,
        Some(HANDLE_CONSTRAINT) => CreateUserError::HandleTaken,
        other => AppError::Conflict(format!(
            "Unique constraint {} violated",
            other.unwrap_or("<unknown>")
        ))
        .into(),
    }
}
