//! Server-assigned object identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::limits::URI_MAX_LENGTH;
use crate::{Error, ObjectKind, Result};

/// Opaque identifier the remote service assigns to an object.
///
/// Identifiers are unique within a domain and conventionally start with a
/// kind tag (`g-`, `t-`, `d-`). The tag is not enforced here since the
/// service is the authority on its own identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerId(String);

impl ServerId {
    /// Parses an identifier, rejecting empty and oversized values.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidId("identifier is empty".to_string()));
        }
        if s.len() >= URI_MAX_LENGTH {
            return Err(Error::InvalidId(format!(
                "identifier is {} bytes, limit is {}",
                s.len(),
                URI_MAX_LENGTH - 1
            )));
        }
        if s.contains('\0') {
            return Err(Error::InvalidId("identifier contains NUL".to_string()));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind implied by the identifier's leading tag, if it has one.
    #[must_use]
    pub fn tagged_kind(&self) -> Option<ObjectKind> {
        let mut chars = self.0.chars();
        let tag = chars.next()?;
        if chars.next() != Some('-') {
            return None;
        }
        ObjectKind::from_tag(tag)
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ServerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ServerId> for String {
    fn from(id: ServerId) -> Self {
        id.0
    }
}

impl AsRef<str> for ServerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
