//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 128,
        message = "Ensure this field has between 1 and 128 characters."
    ))]
    pub password: String,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 2,
        max = 32,
        message = "Ensure this field has between 2 and 32 characters."
    ))]
    pub username: String,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Ensure this field has between 8 and 128 characters."
    ))]
    pub password: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(
        min = 1,
        max = 128,
        message = "Ensure this field has between 1 and 128 characters."
    ))]
    pub current_password: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Ensure this field has between 8 and 128 characters."
    ))]
    pub new_password: String,
}
