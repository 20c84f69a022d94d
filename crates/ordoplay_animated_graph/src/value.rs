// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property values handed to the props sink.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property map applied to a view, in insertion order
pub type PropMap = IndexMap<String, PropValue>;

/// Value of a single view property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Unset; restores the view's default
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Packed ARGB color
    Color(u32),
    /// String
    String(String),
    /// Array
    Array(Vec<PropValue>),
    /// Nested map
    Map(PropMap),
}

impl PropValue {
    /// Numeric value, if this is a number or a color
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Color(c) => Some(f64::from(*c)),
            _ => None,
        }
    }

    /// String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Nested map
    pub fn as_map(&self) -> Option<&PropMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this is [`PropValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&Value> for PropValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from(value)))
                    .collect(),
            ),
        }
    }
}
