//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod rate_limit;

pub use auth::auth_middleware;
pub use rate_limit::{FailureRateLimiter, RateLimitInfo};
