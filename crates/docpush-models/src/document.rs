//! Dynamically-typed document values.
//!
//! Documents arrive as JSON objects. They are converted into a closed sum type
//! so the wire encoder can match every case exhaustively.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single document: string keys mapped to values.
pub type Document = BTreeMap<String, DocumentValue>;

/// A value inside a document.
///
/// Numbers are split into `Integer` and `Float` by exact integral-ness, so
/// `1`, `1.0` and `-3e2` are all integers while `1.5` is a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DocumentValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<DocumentValue>),
    Map(BTreeMap<String, DocumentValue>),
}

impl DocumentValue {
    /// Convert a JSON object into a document. Returns `None` for non-objects.
    pub fn document_from_json(value: Value) -> Option<Document> {
        match value {
            Value::Object(map) => Some(Self::map_from_json(map)),
            _ => None,
        }
    }

    fn map_from_json(map: Map<String, Value>) -> BTreeMap<String, DocumentValue> {
        map.into_iter().map(|(k, v)| (k, v.into())).collect()
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return DocumentValue::Integer(i);
        }

        // u64 beyond i64::MAX, or a float literal
        match n.as_f64() {
            Some(f) if is_integral(f) => DocumentValue::Integer(f as i64),
            Some(f) => DocumentValue::Float(f),
            None => DocumentValue::Null,
        }
    }
}

/// True when `f` equals its truncation and fits in an `i64`.
fn is_integral(f: f64) -> bool {
    // 2^63 is exactly representable; the valid range is [-2^63, 2^63).
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.is_finite() && f.trunc() == f && (-LIMIT..LIMIT).contains(&f)
}

impl From<Value> for DocumentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocumentValue::Null,
            Value::Bool(b) => DocumentValue::Boolean(b),
            Value::Number(n) => DocumentValue::from_number(&n),
            Value::String(s) => DocumentValue::String(s),
            Value::Array(items) => {
                DocumentValue::Array(items.into_iter().map(DocumentValue::from).collect())
            }
            Value::Object(map) => DocumentValue::Map(DocumentValue::map_from_json(map)),
        }
    }
}

impl From<DocumentValue> for Value {
    fn from(value: DocumentValue) -> Self {
        match value {
            DocumentValue::Null => Value::Null,
            DocumentValue::String(s) => Value::String(s),
            DocumentValue::Integer(i) => Value::from(i),
            DocumentValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            DocumentValue::Boolean(b) => Value::Bool(b),
            DocumentValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            DocumentValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for DocumentValue {
    fn from(s: &str) -> Self {
        DocumentValue::String(s.to_string())
    }
}

impl From<String> for DocumentValue {
    fn from(s: String) -> Self {
        DocumentValue::String(s)
    }
}

impl From<i64> for DocumentValue {
    fn from(i: i64) -> Self {
        DocumentValue::Integer(i)
    }
}

impl From<f64> for DocumentValue {
    fn from(f: f64) -> Self {
        if is_integral(f) {
            DocumentValue::Integer(f as i64)
        } else {
            DocumentValue::Float(f)
        }
    }
}

impl From<bool> for DocumentValue {
    fn from(b: bool) -> Self {
        DocumentValue::Boolean(b)
    }
}
