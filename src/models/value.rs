//! Attribute values, raw and normalized.
//!
//! Sources hand over [`RawValue`]s, a tagged variant decided once at the
//! boundary. The normalizer turns them into [`Property`] values, which are
//! the only thing ever stored on a node or edge.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A stored, atomic property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Property {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view, parsing strings when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Property::Int(i) => Some(*i as f64),
            Property::Float(f) => Some(*f),
            Property::Str(s) => s.trim().parse().ok(),
            Property::Bool(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Property::Bool(b) => JsonValue::Bool(*b),
            Property::Int(i) => JsonValue::from(*i),
            Property::Float(f) => JsonValue::from(*f),
            Property::Str(s) => JsonValue::String(s.clone()),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Bool(b) => write!(f, "{}", b),
            Property::Int(i) => write!(f, "{}", i),
            Property::Float(x) => write!(f, "{}", x),
            Property::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Property::Str(s.to_string())
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        Property::Str(s)
    }
}

impl From<i64> for Property {
    fn from(i: i64) -> Self {
        Property::Int(i)
    }
}

impl From<f64> for Property {
    fn from(f: f64) -> Self {
        Property::Float(f)
    }
}

impl From<bool> for Property {
    fn from(b: bool) -> Self {
        Property::Bool(b)
    }
}

/// A source value before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Scalar(Property),
    List(Vec<RawValue>),
    Nested(BTreeMap<String, RawValue>),
}

/// A source record: key/value pairs in deterministic key order.
pub type RawRecord = BTreeMap<String, RawValue>;

impl RawValue {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RawValue>,
    {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Property> for RawValue {
    fn from(p: Property) -> Self {
        RawValue::Scalar(p)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Scalar(s.into())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Scalar(s.into())
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Scalar(i.into())
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Scalar(f.into())
    }
}

impl From<JsonValue> for RawValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RawValue::Null,
            JsonValue::Bool(b) => RawValue::Scalar(Property::Bool(b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Scalar(Property::Int(i)),
                None => n
                    .as_f64()
                    .map(|f| RawValue::Scalar(Property::Float(f)))
                    .unwrap_or(RawValue::Null),
            },
            JsonValue::String(s) => RawValue::Scalar(Property::Str(s)),
            JsonValue::Array(items) => RawValue::List(items.into_iter().map(Into::into).collect()),
            JsonValue::Object(map) => {
                RawValue::Nested(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Converts a JSON object into a raw record; other JSON shapes yield an empty record.
pub fn record_from_json(value: JsonValue) -> RawRecord {
    match value {
        JsonValue::Object(map) => map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        _ => RawRecord::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_value_from_json() {
        let raw = RawValue::from(json!({"a": [1, "x", null], "b": {"c": 2.5}}));
        let RawValue::Nested(map) = raw else {
            panic!("expected nested value");
        };
        assert_eq!(
            map["a"],
            RawValue::List(vec![1i64.into(), "x".into(), RawValue::Null])
        );
        assert!(matches!(map["b"], RawValue::Nested(_)));
    }

    #[test]
    fn test_property_display() {
        assert_eq!(Property::from("HP:0001250").to_string(), "HP:0001250");
        assert_eq!(Property::Int(3).to_string(), "3");
        assert_eq!(Property::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_property_as_f64() {
        assert_eq!(Property::from("0.25").as_f64(), Some(0.25));
        assert_eq!(Property::Int(2).as_f64(), Some(2.0));
        assert_eq!(Property::from("n/a").as_f64(), None);
    }

    #[test]
    fn test_property_untagged_serde() {
        let props: Vec<Property> = serde_json::from_value(json!([true, 4, 1.5, "x"])).unwrap();
        assert_eq!(
            props,
            vec![
                Property::Bool(true),
                Property::Int(4),
                Property::Float(1.5),
                Property::from("x")
            ]
        );
    }
}
