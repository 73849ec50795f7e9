//! # Siege Server
//!
//! Account and token authentication backend for the Siege messaging service.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - User store (PostgreSQL or in-memory)
//! - HTTP server

use anyhow::Result;
use tracing::info;

use siege_server::config::Settings;
use siege_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    siege_server::telemetry::init_tracing();

    info!("Starting Siege server...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        persistent = settings.database.url.is_some(),
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
