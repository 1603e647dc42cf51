//! Object kinds and their wire spellings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// The category of object a handle or server identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// The root group of a domain.
    Container,
    Group,
    Dataset,
    NamedType,
    Attribute,
    Link,
    /// Placeholder for a handle whose target has not been looked up yet.
    Unresolved,
}

impl ObjectKind {
    /// The four kinds that live in a server collection and can be referenced.
    pub const OBJECTS: [ObjectKind; 4] = [
        ObjectKind::Container,
        ObjectKind::Group,
        ObjectKind::NamedType,
        ObjectKind::Dataset,
    ];

    /// REST collection that addresses objects of this kind.
    ///
    /// Containers are addressed through their root group, so both
    /// `Container` and `Group` map to `groups`.
    #[must_use]
    pub const fn collection(self) -> Option<&'static str> {
        match self {
            Self::Container | Self::Group => Some("groups"),
            Self::Dataset => Some("datasets"),
            Self::NamedType => Some("datatypes"),
            Self::Attribute | Self::Link | Self::Unresolved => None,
        }
    }

    /// Maps a collection name from a link or href back to a kind.
    pub fn from_collection(collection: &str) -> Result<Self> {
        match collection {
            "groups" => Ok(Self::Group),
            "datasets" => Ok(Self::Dataset),
            "datatypes" => Ok(Self::NamedType),
            other => Err(Error::UnknownCollection(other.to_string())),
        }
    }

    /// One-character tag the service prefixes onto identifiers of this kind.
    #[must_use]
    pub const fn tag(self) -> Option<char> {
        match self {
            Self::Container | Self::Group => Some('g'),
            Self::NamedType => Some('t'),
            Self::Dataset => Some('d'),
            Self::Attribute | Self::Link | Self::Unresolved => None,
        }
    }

    /// Infers the kind of a server identifier from its leading tag.
    #[must_use]
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'g' => Some(Self::Group),
            't' => Some(Self::NamedType),
            'd' => Some(Self::Dataset),
            _ => None,
        }
    }

    /// Whether objects of this kind may contain links to children.
    #[must_use]
    pub const fn has_children(self) -> bool {
        matches!(self, Self::Container | Self::Group)
    }

    /// Whether this is one of the four referenceable object kinds.
    #[must_use]
    pub const fn is_object(self) -> bool {
        matches!(
            self,
            Self::Container | Self::Group | Self::NamedType | Self::Dataset
        )
    }

    /// Numeric code used for the target kind of a binary wire reference.
    #[must_use]
    pub const fn wire_code(self) -> Option<u32> {
        match self {
            Self::Container => Some(1),
            Self::Group => Some(2),
            Self::NamedType => Some(3),
            Self::Dataset => Some(5),
            Self::Attribute | Self::Link | Self::Unresolved => None,
        }
    }

    #[must_use]
    pub const fn from_wire_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Container),
            2 => Some(Self::Group),
            3 => Some(Self::NamedType),
            5 => Some(Self::Dataset),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Group => "group",
            Self::Dataset => "dataset",
            Self::NamedType => "named_type",
            Self::Attribute => "attribute",
            Self::Link => "link",
            Self::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "container" => Ok(Self::Container),
            "group" => Ok(Self::Group),
            "dataset" => Ok(Self::Dataset),
            "named_type" | "datatype" => Ok(Self::NamedType),
            "attribute" => Ok(Self::Attribute),
            "link" => Ok(Self::Link),
            "unresolved" => Ok(Self::Unresolved),
            other => Err(Error::UnknownCollection(other.to_string())),
        }
    }
}
