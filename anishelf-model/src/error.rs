//! Error types for the model layer.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating records and forms.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A remote record was not a JSON object.
    #[error("record is not an object")]
    NotAnObject,

    /// A required column was missing or null.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A column was present but unusable.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The record belongs to a different identity than the one requested.
    #[error("record owned by {found}, expected {expected}")]
    OwnerMismatch { expected: String, found: String },

    /// A user-facing form failed validation.
    #[error("{0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
