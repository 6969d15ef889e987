use thiserror::Error;

use crate::domain::ProductField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown product field '{0}'")]
    UnknownField(String),
    #[error("product has no id")]
    MissingId,
    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: ProductField, value: String },
}

impl FieldError {
    pub fn invalid_number(field: ProductField, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field,
            value: value.into(),
        }
    }
}
