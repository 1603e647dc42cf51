//! Core type definitions for the REST VOL connector.
//!
//! This crate defines the vocabulary shared by the JSON extractor and the
//! connector proper:
//! - Object kinds and the collection/tag each one maps to on the wire
//! - Server-assigned object identifiers
//! - Remote service versions and the feature gates they unlock
//! - Fixed protocol limits

mod ids;
mod kind;
pub mod limits;
mod version;

pub use ids::ServerId;
pub use kind::ObjectKind;
pub use version::{Feature, ServerVersion};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed server identifier.
    #[error("invalid server identifier: {0}")]
    InvalidId(String),

    /// Unparseable version string.
    #[error("invalid server version: {0}")]
    InvalidVersion(String),

    /// Collection name with no object kind.
    #[error("unknown object collection: {0}")]
    UnknownCollection(String),
}
