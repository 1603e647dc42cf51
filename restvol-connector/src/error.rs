//! Connector error types.

use restvol_json::JsonError;
use thiserror::Error;

use crate::error_stack::Stage;

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors that can occur while resolving, requesting or decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// A path segment or link target does not exist.
    #[error("path not found: {path}: {reason}")]
    PathNotFound { path: String, reason: String },

    /// Operation or feature not offered by this connector or service.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Request failed or returned a non-success status.
    #[error(
        "transport error{}: {message}{}",
        .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(),
        .server_message.as_ref().map(|m| format!(" [server: {m}]")).unwrap_or_default()
    )]
    Transport {
        status: Option<u16>,
        message: String,
        server_message: Option<String>,
    },

    /// Response body could not be extracted.
    #[error(transparent)]
    Json(#[from] JsonError),

    /// A response value is out of range.
    #[error("bad value: {0}")]
    BadValue(String),

    /// Wire reference bytes do not decode.
    #[error("corrupt reference: {0}")]
    CorruptReference(String),

    /// Caller passed an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection settings are missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Identifier or version error.
    #[error(transparent)]
    Types(#[from] restvol_types::Error),
}

/// Flat classification of [`ConnectorError`] for host error records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PathNotFound,
    Unsupported,
    Transport,
    Parse,
    MissingField,
    TypeMismatch,
    BadValue,
    CorruptReference,
    InvalidArgument,
    Config,
}

impl ConnectorError {
    pub(crate) fn not_found(path: &str, reason: impl Into<String>) -> Self {
        ConnectorError::PathNotFound {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(op: impl Into<String>) -> Self {
        ConnectorError::Unsupported(op.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::PathNotFound { .. } => ErrorKind::PathNotFound,
            ConnectorError::Unsupported(_) => ErrorKind::Unsupported,
            ConnectorError::Transport { .. } => ErrorKind::Transport,
            ConnectorError::Json(JsonError::Parse(_)) => ErrorKind::Parse,
            ConnectorError::Json(JsonError::MissingField { .. }) => ErrorKind::MissingField,
            ConnectorError::Json(JsonError::TypeMismatch { .. }) => ErrorKind::TypeMismatch,
            ConnectorError::Json(JsonError::BadValue { .. }) | ConnectorError::BadValue(_) => {
                ErrorKind::BadValue
            }
            ConnectorError::CorruptReference(_) => ErrorKind::CorruptReference,
            ConnectorError::InvalidArgument(_) | ConnectorError::Types(_) => {
                ErrorKind::InvalidArgument
            }
            ConnectorError::Config(_) => ErrorKind::Config,
        }
    }

    /// The sub-step an operation was in when this error was raised.
    pub fn stage(&self) -> Stage {
        match self {
            ConnectorError::PathNotFound { .. } => Stage::Resolve,
            ConnectorError::Transport { .. } => Stage::Transport,
            ConnectorError::Json(_) | ConnectorError::Types(_) => Stage::Parse,
            ConnectorError::CorruptReference(_) | ConnectorError::BadValue(_) => Stage::Reference,
            ConnectorError::Unsupported(_)
            | ConnectorError::InvalidArgument(_)
            | ConnectorError::Config(_) => Stage::Validate,
        }
    }

    /// HTTP status carried by a transport error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectorError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns true if the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
