//! Remote service versions and the features they gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Semantic version reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Server capabilities that only exist from a given version onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Listing links in creation order (`?CreateOrder=1`).
    CreationOrderIndex,
    /// Link names carried in the request body rather than the URL.
    LongNames,
}

impl Feature {
    /// First server version that supports this feature.
    #[must_use]
    pub const fn minimum_version(self) -> ServerVersion {
        match self {
            Self::CreationOrderIndex => ServerVersion::new(0, 8, 0),
            Self::LongNames => ServerVersion::new(0, 8, 6),
        }
    }
}

impl ServerVersion {
    /// Version assumed when the service does not report one.
    pub const UNKNOWN: ServerVersion = ServerVersion::new(0, 0, 0);

    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `major.minor.patch`. Missing trailing components count as 0
    /// and a pre-release/build suffix on the last component is ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidVersion("empty version string".to_string()));
        }

        let mut parts = [0u32; 3];
        for (i, raw) in trimmed.split('.').enumerate() {
            if i >= 3 {
                return Err(Error::InvalidVersion(s.to_string()));
            }
            let digits: &str = raw
                .split(|c: char| c == '-' || c == '+')
                .next()
                .unwrap_or_default();
            parts[i] = digits
                .parse()
                .map_err(|_| Error::InvalidVersion(s.to_string()))?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    #[must_use]
    pub fn matches_or_exceeds(&self, major: u32, minor: u32, patch: u32) -> bool {
        *self >= Self::new(major, minor, patch)
    }

    #[must_use]
    pub fn supports(&self, feature: Feature) -> bool {
        *self >= feature.minimum_version()
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
