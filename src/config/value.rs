//! Free-form configuration values.
//!
//! A handful of fields (allow lists, detection points, PSK keys) accept
//! arbitrary nested data. They are held as a tagged union instead of an
//! untyped blob so the rest of the schema stays strongly typed and the
//! data still round-trips through both input formats.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as Json;

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Scalar, ordered sequence, or string-keyed mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Convert a parsed input tree, dropping `null` entries.
    ///
    /// Returns `None` when `json` itself is `null`.
    pub fn from_json(json: &Json) -> Option<Self> {
        let value = match json {
            Json::Null => return None,
            Json::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Scalar(Scalar::Int(i)),
                None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Json::String(s) => Value::Scalar(Scalar::String(s.clone())),
            Json::Array(items) => Value::Sequence(items.iter().filter_map(Value::from_json).collect()),
            Json::Object(map) => Value::Mapping(
                map.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            ),
        };
        Some(value)
    }

    /// Overlay `json` onto this value.
    ///
    /// Mappings merge key by key (recursively); anything else replaces.
    pub fn merge_json(&mut self, json: &Json) {
        match (self, json) {
            (Value::Mapping(entries), Json::Object(overlay)) => {
                for (key, item) in overlay {
                    if item.is_null() {
                        continue;
                    }
                    match entries.get_mut(key) {
                        Some(existing) => existing.merge_json(item),
                        None => {
                            if let Some(v) = Value::from_json(item) {
                                entries.insert(key.clone(), v);
                            }
                        }
                    }
                }
            }
            (slot, json) => {
                if let Some(v) = Value::from_json(json) {
                    *slot = v;
                }
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}
