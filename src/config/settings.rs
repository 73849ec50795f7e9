//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Token signing settings
    pub auth: AuthSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// Failed-credential rate limiting
    pub rate_limit: RateLimitSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL; without one users live in memory
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Token authentication configuration.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    /// Server secret every token is signed with.
    ///
    /// Changing it invalidates every token ever issued.
    pub secret_key: String,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// Limits on rejected credentials per client.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Rejected tokens allowed inside one window
    pub max_failed_attempts: u32,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Identify clients by `X-Forwarded-For`/`X-Real-IP`; only behind a trusted proxy
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Minimum required length for the token secret (256 bits = 32 bytes)
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the secret key is too short.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", 1420070400000_u64)?
            .set_default("rate_limit.max_failed_attempts", 10)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("rate_limit.trust_forwarded_headers", false)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.secret_key", std::env::var("SECRET_KEY").ok())?
            .set_override_option(
                "snowflake.machine_id",
                std::env::var("SNOWFLAKE_MACHINE_ID").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate())
    }

    /// Reject settings the server must not start with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.auth.secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err(ConfigError::Message(format!(
                "Secret key must be at least {} characters for security. Current length: {}",
                MIN_SECRET_KEY_LENGTH,
                self.auth.secret_key.len()
            )));
        }

        if self.rate_limit.max_failed_attempts == 0 || self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::Message(
                "Rate limit attempts and window must both be positive".into(),
            ));
        }

        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
