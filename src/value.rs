//! In-memory document model.
//!
//! Every parsed fragment, the merge accumulator and the resolved output are
//! [`Value`] trees. Mappings keep insertion order so output is deterministic,
//! but order never affects merge semantics.

use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// Insertion-ordered mapping with unique string keys.
pub type Mapping = IndexMap<String, Value>;

/// A leaf value, compared by its original type.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
}

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Create a string scalar.
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for mappings and sequences.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Mapping(_) | Value::Sequence(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Follow a dot-separated path through mappings (and sequences, by index).
    ///
    /// Returns `None` when a segment is missing or the current node cannot be
    /// traversed.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |node, segment| match node {
            Value::Mapping(map) => map.get(segment),
            Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Null | Value::Scalar(_) => None,
        })
    }

    /// Convert a parsed YAML value.
    ///
    /// Scalar keys are stringified, tags are dropped. Mapping or sequence keys
    /// cannot be represented and are rejected.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Self> {
        Ok(match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Scalar(Scalar::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Scalar(Scalar::UInt(u))
                } else {
                    Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_yaml::Value::String(s) => Value::string(s),
            serde_yaml::Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::from_yaml)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    let key = match Value::from_yaml(key)? {
                        Value::Null => "null".to_string(),
                        Value::Scalar(scalar) => scalar.to_string(),
                        other => {
                            return Err(anyhow!("unsupported mapping key: {}", other));
                        }
                    };
                    out.insert(key, Value::from_yaml(value)?);
                }
                Value::Mapping(out)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value)?,
        })
    }

    /// Parse a YAML document. An empty document yields `Null`.
    pub fn parse_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
        Value::from_yaml(yaml)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Value::Scalar(Scalar::Int(i)),
            Err(_) => Value::Scalar(Scalar::UInt(u)),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        let inf = if f > 0.0 { ".inf" } else { "-.inf" };
        inf.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        // Debug keeps an exponent for large magnitudes, so 1e16 never reads as an integer
        format!("{:?}", f)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::UInt(u) => write!(f, "{}", u),
            Scalar::Float(x) => write!(f, "{}", format_float(*x)),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

/// Display string: scalars render bare, structures as compact JSON.
///
/// This rendering is also the equality used by `AppendUnique` for structured
/// list items, so it must stay order-sensitive and stable.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Scalar(scalar) => write!(f, "{}", scalar),
            Value::Sequence(_) | Value::Mapping(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Value::Scalar(Scalar::UInt(u)) => serializer.serialize_u64(*u),
            Value::Scalar(Scalar::Float(x)) => serializer.serialize_f64(*x),
            Value::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

/// Build a [`Mapping`] from `key => value` pairs.
#[macro_export]
macro_rules! mapping {
    () => { $crate::value::Mapping::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Mapping::new();
        $( map.insert(($key).to_string(), $crate::value::Value::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_types_and_order() {
        let value = Value::parse_yaml("b: 1\na: true\nc: 1.5\nd: text\ne: ~\n").unwrap();
        let map = value.as_mapping().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c", "d", "e"]);
        assert_eq!(map["b"], Value::from(1));
        assert_eq!(map["a"], Value::from(true));
        assert_eq!(map["c"], Value::from(1.5));
        assert_eq!(map["d"], Value::from("text"));
        assert!(map["e"].is_null());
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let value = Value::parse_yaml("1: one\ntrue: yes\n").unwrap();
        let map = value.as_mapping().unwrap();
        assert!(map.contains_key("1"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_structured_key_rejected() {
        assert!(Value::parse_yaml("? [a, b]\n: value\n").is_err());
    }

    #[test]
    fn test_tags_are_dropped() {
        let value = Value::parse_yaml("a: !custom hello\n").unwrap();
        assert_eq!(value.lookup("a"), Some(&Value::from("hello")));
    }

    #[test]
    fn test_empty_document_is_null() {
        assert!(Value::parse_yaml("   \n").unwrap().is_null());
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(2.0).to_string(), "2.0");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from("plain").to_string(), "plain");

        let nested = Value::Mapping(mapping! { "b" => 1, "a" => vec![Value::from("x")] });
        assert_eq!(nested.to_string(), r#"{"b":1,"a":["x"]}"#);
    }

    #[test]
    fn test_large_unsigned_integer_keeps_its_type() {
        let value = Value::parse_yaml("big: 18446744073709551615\nsmall: 7\n").unwrap();
        assert_eq!(value.lookup("big"), Some(&Value::from(u64::MAX)));
        assert_eq!(value.lookup("small"), Some(&Value::from(7)));
        assert_eq!(value.lookup("big").unwrap().to_string(), "18446744073709551615");

        let yaml = serde_yaml::to_string(&value).unwrap();
        assert_eq!(yaml, "big: 18446744073709551615\nsmall: 7\n");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"big":18446744073709551615,"small":7}"#);
    }

    #[test]
    fn test_large_integral_float_is_not_an_integer() {
        let float = Value::from(1e16);
        assert_eq!(float.to_string(), "1e16");
        assert_ne!(float.to_string(), Value::from(10_000_000_000_000_000i64).to_string());
        assert_eq!(Value::from(-3.0).to_string(), "-3.0");
        assert_eq!(Value::from(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_lookup_through_sequences() {
        let value = Value::parse_yaml("servers:\n  - name: a\n  - name: b\n").unwrap();
        assert_eq!(value.lookup("servers.1.name"), Some(&Value::from("b")));
        assert_eq!(value.lookup("servers.x.name"), None);
        assert_eq!(value.lookup("servers.0.name.deeper"), None);
    }
}
