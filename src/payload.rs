//! The semi-structured startup record exchanged between fetchers, the merge
//! engine and the feature blocks.
//!
//! A payload is a JSON object of section name to section value. Sections are
//! schemaless at the top level but each block expects an informally fixed
//! inner shape, so reads go through the forgiving accessors below instead of
//! typed deserialization.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

pub type Payload = Map<String, Value>;

pub const PROFILE: &str = "profile";
pub const FUNDING: &str = "funding";
pub const FOUNDERS: &str = "founders";
pub const MARKET: &str = "market";
pub const COMPETITION: &str = "competition";
pub const SENTIMENT: &str = "sentiment";
pub const COMPLIANCE: &str = "compliance";
pub const PRODUCT: &str = "product";
pub const HIRING: &str = "hiring";
pub const KNOWLEDGE: &str = "knowledge";

static EMPTY_SECTION: Lazy<Map<String, Value>> = Lazy::new(Map::new);

/// Mapping-typed section, or an empty mapping when absent or not a mapping
pub fn section<'a>(payload: &'a Payload, name: &str) -> &'a Map<String, Value> {
    payload
        .get(name)
        .and_then(Value::as_object)
        .unwrap_or(&EMPTY_SECTION)
}

/// Sequence-typed section, or an empty slice when absent or not a sequence
pub fn records<'a>(payload: &'a Payload, name: &str) -> &'a [Value] {
    payload
        .get(name)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Field value, treating explicit nulls as absent
pub fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

/// Lenient float coercion.
///
/// # Accepted Formats
///
/// * **Number**: used directly
/// * **String**: trimmed and parsed (`"0.25"` → 0.25)
/// * **Bool**: `true` → 1.0, `false` → 0.0
///
/// Anything else (null, mappings, sequences, unparseable text) yields `None`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Lenient integer coercion; fractional values truncate toward zero
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Truthiness: null, false, zero, and empty strings/sequences/mappings are false
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value as a flat label: strings verbatim, everything else as compact JSON
pub fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric field with a zero default
pub fn number_or_zero(map: &Map<String, Value>, key: &str) -> f64 {
    present(map, key).and_then(as_number).unwrap_or(0.0)
}

/// Integer field with a zero default
pub fn integer_or_zero(map: &Map<String, Value>, key: &str) -> i64 {
    present(map, key).and_then(as_integer).unwrap_or(0)
}

/// True when the value is null or a blank string
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Short name for a value's variant, used in merge conflict logs
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
