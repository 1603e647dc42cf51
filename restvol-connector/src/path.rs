//! Pathname normalization.

use crate::error::{ConnectorError, ConnectorResult};

/// A pathname split into link names.
///
/// Leading spaces are ignored, empty and `.` components are dropped, and
/// `..` is kept as an ordinary link name since the store has no parent
/// links. An absolute path with no components names the domain root; a
/// relative one with no components names the starting object itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    absolute: bool,
    segments: Vec<String>,
}

impl NormalizedPath {
    pub fn parse(raw: &str) -> ConnectorResult<Self> {
        let trimmed = raw.trim_start_matches(' ');
        if trimmed.is_empty() {
            return Err(ConnectorError::InvalidArgument(
                "path is empty".to_string(),
            ));
        }

        let absolute = trimmed.starts_with('/');
        let segments = trimmed
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect();

        Ok(Self { absolute, segments })
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for `/` and `.` style paths that name no link.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Absolute form of this path, given the absolute path of the object a
    /// relative path starts from.
    pub fn absolute_under(&self, base: Option<&str>) -> Option<String> {
        let prefix = if self.absolute { "" } else { base?.trim_end_matches('/') };
        if self.segments.is_empty() {
            return Some(if prefix.is_empty() { "/".to_string() } else { prefix.to_string() });
        }
        Some(format!("{prefix}/{}", self.segments.join("/")))
    }
}

impl NormalizedPath {
    /// Splits off the last link name, returning the path of the group that
    /// holds it. Fails for paths that name no link.
    pub fn parent_and_name(&self) -> Option<(String, &str)> {
        let (name, parents) = self.segments.split_last()?;
        let parent = match (self.absolute, parents.is_empty()) {
            (true, _) => format!("/{}", parents.join("/")),
            (false, true) => ".".to_string(),
            (false, false) => parents.join("/"),
        };
        Some((parent, name.as_str()))
    }
}

/// Joins a link name onto an absolute group path.
pub(crate) fn child_path(parent: Option<&str>, name: &str) -> Option<String> {
    let parent = parent?.trim_end_matches('/');
    Some(format!("{parent}/{name}"))
}
