//! Key paths into a JSON document.

use std::fmt;

/// One step of a key path: an object member or an array position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// An ordered sequence of member names and array indices that addresses a
/// single value in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// Builds a path made only of object member names.
    pub fn keys(keys: &[&str]) -> Self {
        Self {
            segments: keys.iter().map(|k| Segment::Key((*k).to_string())).collect(),
        }
    }

    /// Appends an object member.
    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.segments.push(Segment::Key(key.to_string()));
        self
    }

    /// Appends an array index.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Renders this path relative to `prefix` for error messages.
    pub(crate) fn display_under(&self, prefix: &str) -> String {
        let own = self.to_string();
        match (prefix.is_empty(), own.is_empty()) {
            (true, _) => own,
            (false, true) => prefix.to_string(),
            (false, false) if own.starts_with('[') => format!("{prefix}{own}"),
            (false, false) => format!("{prefix}.{own}"),
        }
    }
}

impl From<&[&str]> for KeyPath {
    fn from(keys: &[&str]) -> Self {
        Self::keys(keys)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(keys: [&str; N]) -> Self {
        Self::keys(&keys)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}
