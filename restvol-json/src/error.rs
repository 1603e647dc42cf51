//! JSON extraction error types.

use thiserror::Error;

use crate::JsonType;

/// Result type for JSON extraction.
pub type JsonResult<T> = Result<T, JsonError>;

/// Errors raised while parsing or walking a response document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    /// The body is not valid JSON.
    #[error("malformed JSON: {0}")]
    Parse(String),

    /// A required key path is absent or null.
    #[error("missing field: {path}")]
    MissingField { path: String },

    /// The value has the wrong JSON type.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: JsonType,
        found: JsonType,
    },

    /// The value has the right type but is out of range.
    #[error("bad value at {path}: {reason}")]
    BadValue { path: String, reason: String },
}

impl JsonError {
    /// Path of the offending field, if the error concerns one.
    pub fn path(&self) -> Option<&str> {
        match self {
            JsonError::Parse(_) => None,
            JsonError::MissingField { path }
            | JsonError::TypeMismatch { path, .. }
            | JsonError::BadValue { path, .. } => Some(path),
        }
    }
}

impl From<serde_json::Error> for JsonError {
    fn from(e: serde_json::Error) -> Self {
        JsonError::Parse(e.to_string())
    }
}
