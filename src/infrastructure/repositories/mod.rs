//! Repository Implementations
//!
//! Implementations of the domain repository traits.
//!
//! - **PgUserRepository** - PostgreSQL-backed accounts
//! - **InMemoryUserRepository** - process-local accounts for development and tests

pub mod memory_user_repository;
pub mod user_repository;

pub use memory_user_repository::InMemoryUserRepository;
pub use user_repository::PgUserRepository;
