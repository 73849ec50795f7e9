//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, login, password changes
//! - **UserService**: User profile lookups

pub mod auth_service;
pub mod user_service;

pub use auth_service::{pick_tag, AccountError, AuthService, AuthServiceImpl};
pub use user_service::{UserDto, UserService, UserServiceImpl};
