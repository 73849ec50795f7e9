//! # Domain Services
//!
//! Domain services encapsulate logic that doesn't naturally belong to a
//! single entity.
//!
//! ## Services
//!
//! - **TokenCodec**: Issue and verify versioned HMAC bearer tokens
//! - **AuthenticationGate**: Resolve a request's `Authorization` header to a user

mod authentication_gate;
mod token_codec;

pub use authentication_gate::{
    Authentication, AuthenticatedUser, AuthenticationGate, AuthError, TOKEN_SCHEME,
};
pub use token_codec::{TokenClaim, TokenCodec, TokenError, TokenVersion, VerifiedToken};
