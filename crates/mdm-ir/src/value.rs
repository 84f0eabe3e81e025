//! Tagged JSON value union used for attribute maps, defaults, and configs
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A JSON-compatible value
///
/// Serialized untagged, so `Value` round-trips through plain JSON/YAML text.
/// Integers and floats are kept apart so whole numbers stay whole on output,
/// but they compare numerically (`Integer(1) == Float(1.0)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON `null`
    #[default]
    Null,

    /// JSON boolean
    Bool(bool),

    /// Whole number that fits in an `i64`
    Integer(i64),

    /// Any other finite or non-finite number
    Float(f64),

    /// JSON string
    String(String),

    /// JSON array
    List(Vec<Value>),

    /// JSON object, keys kept sorted
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is a number (integer or float)
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Check if value is a finite number
    pub fn is_finite_number(&self) -> bool {
        self.as_f64().is_some_and(f64::is_finite)
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get any number as `f64`
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get a whole number as `i64`, accepting floats with no fractional part
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Borrow the list payload
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the map payload
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// JSON type name, as reported in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
        }
    }

    /// Serialize to compact JSON text
    pub fn to_json_string(&self) -> String {
        serde_json::Value::from(self.clone()).to_string()
    }

    /// Consume a map value, or report what was found instead
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeMismatch`] when the value is not an object.
    pub fn into_map(self) -> crate::Result<BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Ok(map),
            Value::Null => Ok(BTreeMap::new()),
            other => Err(crate::Error::type_mismatch("object", other.type_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_integers_whole() {
        let value = Value::from(json!({"a": 1, "b": 1.5, "c": [true, null, "x"]}));
        let map = value.as_map().unwrap();
        assert!(matches!(map["a"], Value::Integer(1)));
        assert!(matches!(map["b"], Value::Float(f) if (f - 1.5).abs() < f64::EPSILON));
        assert_eq!(map["c"].as_list().unwrap().len(), 3);
    }

    #[test]
    fn test_numeric_equality_across_variants() {
        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::Float(1.5));
        assert_ne!(Value::Integer(1), Value::String("1".to_string()));
    }

    #[test]
    fn test_untagged_deserialize() {
        let value: Value = serde_json::from_str(r#"{"n": null, "i": 3, "f": 0.25, "s": "x"}"#)
            .unwrap();
        assert!(value.get("n").unwrap().is_null());
        assert_eq!(value.get("i").unwrap().as_i64(), Some(3));
        assert_eq!(value.get("f").unwrap().as_f64(), Some(0.25));
        assert_eq!(value.get("s").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn test_untagged_deserialize_yaml() {
        let value: Value = serde_yaml::from_str("size: m\ncount: 2\ntags: [a, b]").unwrap();
        assert_eq!(value.get("size").unwrap().as_str(), Some("m"));
        assert_eq!(value.get("count").unwrap().as_i64(), Some(2));
        assert_eq!(value.get("tags").unwrap().as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_to_json_string_is_compact() {
        let value = Value::from(json!({"b": [1, 2], "a": "x"}));
        assert_eq!(value.to_json_string(), r#"{"a":"x","b":[1,2]}"#);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Float(1.0).type_name(), "number");
        assert_eq!(Value::List(vec![]).type_name(), "array");
        assert_eq!(Value::Map(BTreeMap::new()).type_name(), "object");
    }

    #[test]
    fn test_as_i64_rejects_fractional_floats() {
        assert_eq!(Value::Float(4.0).as_i64(), Some(4));
        assert_eq!(Value::Float(4.5).as_i64(), None);
        assert_eq!(Value::String("4".into()).as_i64(), None);
    }

    #[test]
    fn test_into_map() {
        assert!(Value::Null.into_map().unwrap().is_empty());
        assert!(Value::from(json!({"a": 1})).into_map().is_ok());
        assert!(matches!(
            Value::from(json!([1])).into_map(),
            Err(crate::Error::TypeMismatch { .. })
        ));
    }
}
