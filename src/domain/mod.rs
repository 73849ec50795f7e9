//! # Domain Layer
//!
//! The domain layer contains the core business logic of the server.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: The user account and its repository contracts
//! - **services**: Token issuing/verification and request authentication
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - The server key reaches the token codec through its constructor only

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
