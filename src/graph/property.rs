//! Scalar property values for nodes and query result rows

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scalar property value
///
/// Serialized untagged so that result rows render as plain JSON scalars.
/// Integer and Float stay distinct: `42` and `42.0` are different values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl PropertyValue {
    /// Numeric view of Integer or Float
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Decode a JSON scalar as returned by the store.
    ///
    /// Numbers that fit `i64` become Integer, all other numbers Float.
    /// Composite JSON values are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Integer(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => PropertyValue::String(s.clone()),
            other => PropertyValue::String(other.to_string()),
        }
    }

    /// Cypher `toInteger`: integers pass through, floats and numeric strings
    /// truncate toward zero, anything else is null.
    pub fn to_integer(&self) -> PropertyValue {
        match self {
            PropertyValue::Integer(i) => PropertyValue::Integer(*i),
            PropertyValue::Float(f) if f.is_finite() => PropertyValue::Integer(f.trunc() as i64),
            PropertyValue::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    PropertyValue::Integer(i)
                } else {
                    match s.parse::<f64>() {
                        Ok(f) if f.is_finite() => PropertyValue::Integer(f.trunc() as i64),
                        _ => PropertyValue::Null,
                    }
                }
            }
            _ => PropertyValue::Null,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{:?}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

/// Property map for storing node properties
pub type PropertyMap = HashMap<String, PropertyValue>;
