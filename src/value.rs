use serde::{Deserialize, Serialize};

use crate::Result;

/// A decoded evaluation result.
///
/// Unlike [`serde_json::Value`], scalars that the typed accessors care about get their own
/// variants and everything else (arrays and objects) lands in [`Value::Structured`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// The engine returned no value, or JSON `null`.
    #[default]
    Absent,
    /// A JSON boolean.
    Bool(bool),
    /// Integer or floating point; [`serde_json::Number`] keeps track of which.
    Number(serde_json::Number),
    /// A JSON string.
    String(String),
    /// A JSON array or object.
    Structured(serde_json::Value),
}

impl Value {
    /// Decode an evaluation buffer. An empty buffer decodes to [`Value::Absent`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
        if bytes.is_empty() {
            return Ok(Value::Absent);
        }
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(Value::from(value))
    }

    /// Returns `true` if there is no value.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer view of a number. Floats are truncated toward zero, saturating at the bounds of
    /// `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        let Value::Number(n) = self else {
            return None;
        };
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
        if let Some(u) = n.as_u64() {
            return Some(i64::try_from(u).unwrap_or(i64::MAX));
        }
        n.as_f64().map(|f| f as i64)
    }

    /// Floating point view of a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Absent,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            structured @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::Structured(structured)
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Absent => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Structured(v) => v,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}
