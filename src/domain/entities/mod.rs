//! # Domain Entities
//!
//! Core domain entities. Guilds, channels, members, rooms and messages are
//! owned by other services; this crate only needs the user account that
//! tokens are issued for.
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod user;

pub use user::{
    normalize_email, parse_user_id, CreateUserError, User, UserLookup, UserRepository, MAX_TAG,
    MIN_TAG,
};
