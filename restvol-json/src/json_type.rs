use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON value categories a lookup can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Null,
    Boolean,
    /// Any number that fits `i64` or `u64`.
    Integer,
    /// Any number, integral or not.
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    /// The most specific category of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether `value` satisfies a lookup that expects `self`.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, Self::of(value)) {
            (Self::Number, Self::Integer) => true,
            (expected, found) => expected == found,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}
