//! # Siege Server Library
//!
//! Accounts and token authentication for the Siege messaging backend:
//! - Stateless, revocable `v1` tokens signed with HMAC-SHA256
//! - An authentication gate for `Authorization: Token <token>` headers
//! - Registration, login and password changes over a REST API
//! - PostgreSQL or in-memory user storage
//!
//! ## Architecture
//!
//! - **Domain Layer**: User entity, token codec, authentication gate
//! - **Application Layer**: Account services and DTOs
//! - **Infrastructure Layer**: User stores and metrics
//! - **Presentation Layer**: HTTP handlers, extractors and middleware
//!
//! ## Module Structure
//!
//! ```text
//! siege_server/
//! +-- config/         Configuration management
//! +-- domain/         Entities, token codec, authentication gate
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, repositories, metrics
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Common utilities (errors, crypto, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
