//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure. Every `TestApp` runs
//! the full router against its own in-memory user store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use siege_server::config::{
    AuthSettings, CorsSettings, DatabaseSettings, RateLimitSettings, ServerSettings, Settings,
    SnowflakeSettings,
};
use siege_server::domain::{CreateUserError, TokenCodec, User, UserLookup, UserRepository};
use siege_server::infrastructure::repositories::InMemoryUserRepository;
use siege_server::presentation::middleware::FailureRateLimiter;
use siege_server::shared::error::AppError;
use siege_server::shared::snowflake::SnowflakeGenerator;
use siege_server::startup::{build_router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret-key-0123456789";

/// Response status, headers and JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub codec: TokenCodec,
}

pub fn test_settings(max_failed_attempts: u32) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: None,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: 1,
        },
        auth: AuthSettings {
            secret_key: TEST_SECRET.into(),
        },
        snowflake: SnowflakeSettings {
            machine_id: 1,
            epoch: 1420070400000,
        },
        rate_limit: RateLimitSettings {
            max_failed_attempts,
            window_seconds: 60,
            trust_forwarded_headers: false,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        environment: "test".into(),
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(100)
    }

    /// Test application whose clients are limited after `max_failed_attempts` bad tokens
    pub fn with_rate_limit(max_failed_attempts: u32) -> Self {
        let settings = test_settings(max_failed_attempts)
            .validate()
            .expect("test settings are valid");
        let users = Arc::new(InMemoryUserRepository::new());
        let state = AppState::from_settings(&settings, users.clone()).unwrap();

        Self {
            router: build_router(state, &settings),
            users,
            codec: TokenCodec::new(TEST_SECRET).unwrap(),
        }
    }

    /// Send a request; `token` goes out as `Authorization: Token <token>`
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let authorization = token.map(|t| format!("Token {}", t));
        self.request_with_header(method, uri, body, authorization.as_deref())
            .await
    }

    /// Send a request with a raw `Authorization` header value
    pub async fn request_with_header(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// Register through the API and return the response body
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let response = self
            .post(
                "/api/v1/users",
                json!({ "username": username, "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Store a user directly, bypassing password hashing
    pub async fn seed_user(&self, id: i64, email: &str, password_hash: &str) -> User {
        let user = User::new(id, format!("user{}", id), 1, email.into(), password_hash.into());
        self.users.create(&user).await.unwrap()
    }
}

/// Dispatch a request and collect the response
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// A user store whose every call fails
pub struct FailingUserRepository;

fn unavailable() -> AppError {
    AppError::Internal("user store unavailable".into())
}

#[async_trait]
impl UserLookup for FailingUserRepository {
    async fn find_for_token(&self, _user_id: &str) -> Result<Option<User>, AppError> {
        Err(unavailable())
    }
}

#[async_trait]
impl UserRepository for FailingUserRepository {
    async fn find_by_id(&self, _id: i64) -> Result<Option<User>, AppError> {
        Err(unavailable())
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, AppError> {
        Err(unavailable())
    }

    async fn email_exists(&self, _email: &str) -> Result<bool, AppError> {
        Err(unavailable())
    }

    async fn tags_for_username(&self, _username: &str) -> Result<Vec<i16>, AppError> {
        Err(unavailable())
    }

    async fn create(&self, _user: &User) -> Result<User, CreateUserError> {
        Err(unavailable().into())
    }

    async fn update_password(&self, _id: i64, _password_hash: &str) -> Result<User, AppError> {
        Err(unavailable())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(unavailable())
    }
}

/// Router over [`FailingUserRepository`]
pub fn failing_router() -> Router {
    let settings = test_settings(100);
    let state = AppState::new(
        Arc::new(FailingUserRepository),
        TokenCodec::new(TEST_SECRET).unwrap(),
        Arc::new(SnowflakeGenerator::new(1420070400000, 1)),
        FailureRateLimiter::new(100, Duration::from_secs(60)),
    );
    build_router(state, &settings)
}

/// Unique email per call so tests never collide
pub fn unique_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}
