//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;

use crate::application::services::{AuthService, AuthServiceImpl, UserService, UserServiceImpl};
use crate::config::Settings;
use crate::domain::{AuthenticationGate, TokenCodec, UserRepository};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{InMemoryUserRepository, PgUserRepository};
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::middleware::{cors, logging, FailureRateLimiter};
use crate::shared::snowflake::SnowflakeGenerator;

/// How often idle rate limit entries are swept
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub gate: Arc<AuthenticationGate<dyn UserRepository>>,
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub rate_limiter: Arc<FailureRateLimiter>,
}

impl AppState {
    /// Wire services around a user store; `codec` signs every token.
    pub fn new(
        users: Arc<dyn UserRepository>,
        codec: TokenCodec,
        snowflake: Arc<SnowflakeGenerator>,
        rate_limiter: FailureRateLimiter,
    ) -> Self {
        let gate = Arc::new(AuthenticationGate::new(codec.clone(), users.clone()));
        let auth_service: Arc<dyn AuthService> =
            Arc::new(AuthServiceImpl::new(users.clone(), codec, snowflake));
        let user_service: Arc<dyn UserService> = Arc::new(UserServiceImpl::new(users.clone()));

        Self {
            users,
            gate,
            auth_service,
            user_service,
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    pub fn from_settings(settings: &Settings, users: Arc<dyn UserRepository>) -> Result<Self> {
        let codec = TokenCodec::new(&settings.auth.secret_key).context("Invalid token secret")?;

        Ok(Self::new(
            users,
            codec,
            Arc::new(SnowflakeGenerator::from_settings(&settings.snowflake)),
            FailureRateLimiter::from_settings(&settings.rate_limit),
        ))
    }
}

/// Build the full router with middleware
pub fn build_router(state: AppState, settings: &Settings) -> Router {
    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors::create_cors_layer(&settings.cors))
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let users = create_user_store(&settings).await?;
        let state = AppState::from_settings(&settings, users)?;

        spawn_rate_limit_sweeper(state.rate_limiter.clone());

        let router = build_router(state, &settings);

        let addr: SocketAddr = settings
            .server_addr()
            .parse()
            .with_context(|| format!("Invalid server address {}", settings.server_addr()))?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// PostgreSQL when a database URL is configured, process memory otherwise
async fn create_user_store(settings: &Settings) -> Result<Arc<dyn UserRepository>> {
    match &settings.database.url {
        Some(url) => {
            let pool = database::create_pool(url, &settings.database)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            database::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(PgUserRepository::new(pool)))
        }
        None => {
            tracing::warn!("No database URL configured; users are kept in memory");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
    }
}

fn spawn_rate_limit_sweeper(limiter: Arc<FailureRateLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.purge_expired();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
