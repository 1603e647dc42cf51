//! Parsed documents and typed lookups.

use serde_json::{Map, Value};

use crate::error::{JsonError, JsonResult};
use crate::json_type::JsonType;
use crate::key_path::{KeyPath, Segment};

/// A parsed response document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    root: Value,
}

impl ParseTree {
    /// Parses a raw response body.
    pub fn parse(document: &[u8]) -> JsonResult<Self> {
        let root = serde_json::from_slice(document)?;
        Ok(Self { root })
    }

    pub fn parse_str(document: &str) -> JsonResult<Self> {
        Self::parse(document.as_bytes())
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            value: &self.root,
            prefix: String::new(),
        }
    }

    pub fn into_value(self) -> Value {
        self.root
    }
}

/// A borrowed sub-tree, such as one element of a `links` array.
///
/// Errors raised through a node report the full path from the document
/// root.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    value: &'a Value,
    prefix: String,
}

impl<'a> Node<'a> {
    pub fn value(&self) -> &'a Value {
        self.value
    }
}

/// Typed lookups shared by [`ParseTree`] and [`Node`].
pub trait Lookup {
    /// The value lookups start from.
    fn base(&self) -> &Value;

    /// Path of [`Lookup::base`] from the document root.
    fn prefix(&self) -> &str;

    /// Looks up `path` and checks its type.
    ///
    /// Fails with [`JsonError::MissingField`] when any step of the path is
    /// absent and [`JsonError::TypeMismatch`] when the value has the wrong
    /// type.
    fn lookup(&self, path: &KeyPath, expected: JsonType) -> JsonResult<&Value> {
        let value = walk(self.base(), path).ok_or_else(|| JsonError::MissingField {
            path: path.display_under(self.prefix()),
        })?;
        check_type(value, expected, || path.display_under(self.prefix()))?;
        Ok(value)
    }

    /// Like [`Lookup::lookup`], but an absent path yields `None`.
    fn lookup_optional(&self, path: &KeyPath, expected: JsonType) -> JsonResult<Option<&Value>> {
        match walk(self.base(), path) {
            None => Ok(None),
            Some(Value::Null) if expected != JsonType::Null => Ok(None),
            Some(value) => {
                check_type(value, expected, || path.display_under(self.prefix()))?;
                Ok(Some(value))
            }
        }
    }

    /// Tries each path in turn and returns the first one present.
    ///
    /// A present value of the wrong type is an error rather than a reason to
    /// try the next alternative.
    fn lookup_first(&self, paths: &[KeyPath], expected: JsonType) -> JsonResult<&Value> {
        for path in paths {
            if let Some(value) = self.lookup_optional(path, expected)? {
                return Ok(value);
            }
        }
        let tried: Vec<String> = paths
            .iter()
            .map(|p| p.display_under(self.prefix()))
            .collect();
        Err(JsonError::MissingField {
            path: tried.join(" | "),
        })
    }

    fn get_str(&self, path: &KeyPath) -> JsonResult<&str> {
        let value = self.lookup(path, JsonType::String)?;
        Ok(value.as_str().unwrap_or_default())
    }

    fn get_str_first(&self, paths: &[KeyPath]) -> JsonResult<&str> {
        let value = self.lookup_first(paths, JsonType::String)?;
        Ok(value.as_str().unwrap_or_default())
    }

    fn get_bool(&self, path: &KeyPath) -> JsonResult<bool> {
        let value = self.lookup(path, JsonType::Boolean)?;
        Ok(value.as_bool().unwrap_or_default())
    }

    fn get_i64(&self, path: &KeyPath) -> JsonResult<i64> {
        let value = self.lookup(path, JsonType::Integer)?;
        value.as_i64().ok_or_else(|| JsonError::BadValue {
            path: path.display_under(self.prefix()),
            reason: format!("{value} does not fit a signed 64-bit integer"),
        })
    }

    fn get_f64(&self, path: &KeyPath) -> JsonResult<f64> {
        let value = self.lookup(path, JsonType::Number)?;
        Ok(value.as_f64().unwrap_or_default())
    }

    /// Reads a count. Negative values fail with [`JsonError::BadValue`]
    /// rather than being clamped.
    fn get_count(&self, path: &KeyPath) -> JsonResult<u64> {
        let value = self.lookup(path, JsonType::Integer)?;
        match value.as_u64() {
            Some(n) => Ok(n),
            None => Err(JsonError::BadValue {
                path: path.display_under(self.prefix()),
                reason: format!("count must be non-negative, got {value}"),
            }),
        }
    }

    fn get_object(&self, path: &KeyPath) -> JsonResult<&Map<String, Value>> {
        let value = self.lookup(path, JsonType::Object)?;
        value.as_object().ok_or_else(|| JsonError::MissingField {
            path: path.display_under(self.prefix()),
        })
    }

    /// Returns the elements of the array at `path` as nodes.
    fn items(&self, path: &KeyPath) -> JsonResult<Vec<Node<'_>>> {
        let value = self.lookup(path, JsonType::Array)?;
        let base = path.display_under(self.prefix());
        let items = value
            .as_array()
            .map(|array| {
                array
                    .iter()
                    .enumerate()
                    .map(|(i, value)| Node {
                        value,
                        prefix: format!("{base}[{i}]"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}

impl Lookup for ParseTree {
    fn base(&self) -> &Value {
        &self.root
    }

    fn prefix(&self) -> &str {
        ""
    }
}

impl Lookup for Node<'_> {
    fn base(&self) -> &Value {
        self.value
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

fn walk<'v>(mut current: &'v Value, path: &KeyPath) -> Option<&'v Value> {
    for segment in path.segments() {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(i) => current.as_array()?.get(*i)?,
        };
    }
    Some(current)
}

fn check_type(
    value: &Value,
    expected: JsonType,
    path: impl FnOnce() -> String,
) -> JsonResult<()> {
    if expected.accepts(value) {
        Ok(())
    } else {
        Err(JsonError::TypeMismatch {
            path: path(),
            expected,
            found: JsonType::of(value),
        })
    }
}
