//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::TOKEN_SCHEME;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or rejected credentials; answered with a `Token` challenge
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited { retry_after: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
}

impl AppError {
    /// Validation failure on a single field.
    pub fn field(field: &str, message: &str) -> Self {
        AppError::Validation {
            message: format!("{}: {}", field, message),
            errors: vec![FieldError {
                field: field.to_string(),
                message: message.to_string(),
            }],
        }
    }

    /// HTTP status this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut retry_after = None;

        let (code, message, errors) = match self {
            AppError::NotFound(msg) => (10001, msg, None),
            AppError::BadRequest(msg) => (10002, msg, None),
            AppError::Unauthorized(msg) => (10003, msg, None),
            AppError::Forbidden(msg) => (10004, msg, None),
            AppError::Conflict(msg) => (10005, msg, None),
            AppError::RateLimited { retry_after: secs } => {
                retry_after = Some(secs);
                (10006, "You are being rate limited. Please slow down.".into(), None)
            }
            AppError::Validation { message, errors } => (10007, message, Some(errors)),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (10000, "Internal server error".into(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (10000, "Internal server error".into(), None)
            }
        };

        let body = ErrorResponse {
            code,
            message,
            errors,
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(TOKEN_SCHEME),
            );
        }

        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}
