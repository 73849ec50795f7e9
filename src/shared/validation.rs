//! Validation Utilities

use validator::{Validate, ValidationErrors};

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value.".into()),
            })
        })
        .collect();

    // HashMap order is arbitrary
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));

    let message = field_errors
        .first()
        .map(|e| format!("{}: {}", e.field, e.message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation {
        message,
        errors: field_errors,
    }
}

/// Run `validator` rules on a request body.
pub fn validate<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(validation_error)
}
