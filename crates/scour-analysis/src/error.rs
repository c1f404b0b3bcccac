//! Error types for the field model.

use thiserror::Error;

/// Errors produced when resolving field names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The name does not belong to any document field.
    #[error("unknown field: {0}")]
    Unknown(String),
}
