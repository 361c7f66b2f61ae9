//! Validation Error Types

use thiserror::Error;

/// Errors raised while validating a result form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Text field empty after trimming
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Mark left blank
    #[error("{0} mark is required")]
    MissingMark(&'static str),

    /// Mark did not parse as an integer
    #[error("{field} mark '{value}' is not a whole number")]
    NotAnInteger { field: &'static str, value: String },

    /// Mark outside the allowed range
    #[error("{field} mark {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: u32,
        max: u32,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField(field) | ValidationError::MissingMark(field) => field,
            ValidationError::NotAnInteger { field, .. } | ValidationError::OutOfRange { field, .. } => {
                field
            }
        }
    }
}
