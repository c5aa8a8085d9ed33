//! Document to wire-value encoding.
//!
//! Two string sentinels are reinterpreted instead of being stored verbatim:
//! - `"Timestamp"` becomes a `timestampValue` holding the encode time
//! - `"GeoPoint(<lat>, <lng>)"` becomes a `geoPointValue`
//!
//! The timestamp is captured once per document, so every `"Timestamp"` field
//! in one document carries the same instant.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use docpush_models::{Document, DocumentValue};

use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{ArrayValue, GeoPoint, MapValue, Value};

/// Sentinel for "use the current time".
pub const TIMESTAMP_SENTINEL: &str = "Timestamp";

const GEO_POINT_PREFIX: &str = "GeoPoint(";
const GEO_POINT_SUFFIX: &str = ")";

/// Encode a document's fields using the current time for timestamp sentinels.
pub fn encode_document(doc: &Document) -> FirestoreResult<BTreeMap<String, Value>> {
    encode_document_at(doc, Utc::now())
}

/// Encode a document's fields with an explicit time for timestamp sentinels.
pub fn encode_document_at(
    doc: &Document,
    now: DateTime<Utc>,
) -> FirestoreResult<BTreeMap<String, Value>> {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    encode_fields(doc, &timestamp)
}

/// Encode a single value. `timestamp` is the pre-formatted encode time.
pub fn encode_value(value: &DocumentValue, timestamp: &str) -> FirestoreResult<Value> {
    let encoded = match value {
        DocumentValue::Null => Value::NullValue(()),
        DocumentValue::String(s) => encode_string(s, timestamp)?,
        DocumentValue::Integer(i) => Value::IntegerValue(*i),
        DocumentValue::Float(f) => Value::DoubleValue(*f),
        DocumentValue::Boolean(b) => Value::BooleanValue(*b),
        DocumentValue::Array(items) => Value::ArrayValue(ArrayValue {
            values: items
                .iter()
                .map(|item| encode_value(item, timestamp))
                .collect::<FirestoreResult<_>>()?,
        }),
        DocumentValue::Map(map) => Value::MapValue(MapValue {
            fields: encode_fields(map, timestamp)?,
        }),
    };
    Ok(encoded)
}

fn encode_fields(
    map: &BTreeMap<String, DocumentValue>,
    timestamp: &str,
) -> FirestoreResult<BTreeMap<String, Value>> {
    map.iter()
        .map(|(key, value)| -> FirestoreResult<(String, Value)> {
            Ok((key.clone(), encode_value(value, timestamp)?))
        })
        .collect()
}

fn encode_string(s: &str, timestamp: &str) -> FirestoreResult<Value> {
    if s == TIMESTAMP_SENTINEL {
        return Ok(Value::TimestampValue(timestamp.to_string()));
    }
    match parse_geo_point(s) {
        Some(point) => Ok(Value::GeoPointValue(point?)),
        None => Ok(Value::StringValue(s.to_string())),
    }
}

/// Parse a `GeoPoint(<lat>, <lng>)` sentinel.
///
/// Returns `None` when `s` does not start with `GeoPoint(`, and an error when
/// it does but the rest does not match the grammar.
pub fn parse_geo_point(s: &str) -> Option<FirestoreResult<GeoPoint>> {
    let rest = s.strip_prefix(GEO_POINT_PREFIX)?;
    Some(parse_geo_point_body(s, rest))
}

fn parse_geo_point_body(raw: &str, rest: &str) -> FirestoreResult<GeoPoint> {
    let inner = rest
        .strip_suffix(GEO_POINT_SUFFIX)
        .ok_or_else(|| FirestoreError::format(format!("'{}' is missing the closing ')'", raw)))?;

    let (lat, lng) = inner.split_once(',').ok_or_else(|| {
        FirestoreError::format(format!("'{}' must have two comma-separated components", raw))
    })?;

    Ok(GeoPoint {
        latitude: parse_component(raw, "latitude", lat)?,
        longitude: parse_component(raw, "longitude", lng)?,
    })
}

fn parse_component(raw: &str, name: &str, text: &str) -> FirestoreResult<f64> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FirestoreError::format(format!(
            "'{}' has an unparseable {} '{}'",
            raw,
            name,
            text.trim()
        ))),
    }
}
