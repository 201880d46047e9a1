//! Permissive decoding for client input.
//!
//! Malformed numbers never fail a request: they collapse to a documented
//! default instead. Every lenient conversion the service performs lives here.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Lookup key form of a food name: trimmed and lower-cased.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parses a finite real, `None` for anything else.
pub fn lenient_f64(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Nutrient form fields: missing, unparsable, non-finite or negative → 0.
pub fn nutrient_amount(raw: Option<&str>) -> f64 {
    lenient_f64(raw).filter(|v| *v >= 0.0).unwrap_or(0.0)
}

/// Largest serving magnitude a lookup scales to. Beyond it scaled
/// nutrients can overflow to infinity.
pub const MAX_QUANTITY_G: f64 = 1e9;

/// Serving size in grams; anything unusable means the 100 g reference.
pub fn quantity_grams(raw: Option<&str>) -> f64 {
    lenient_f64(raw)
        .filter(|q| q.abs() <= MAX_QUANTITY_G)
        .unwrap_or(100.0)
}

/// Calories carried by a meal line item. Numbers and numeric strings count,
/// everything else (including a missing field) is 0.
pub fn item_calories(item: &Value) -> f64 {
    match item.get("calories") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => lenient_f64(Some(s.as_str())).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Epoch-seconds timestamp from a JSON value; fractional values truncate.
pub fn timestamp_secs(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => lenient_f64(Some(s.as_str())).map(|f| f as i64),
        _ => None,
    }
}

/// Decodes a JSON request body regardless of its content type.
/// An empty or malformed body yields `None`, as does a body that is not
/// shaped like `T`.
pub fn json_body<T: DeserializeOwned>(body: &[u8]) -> Option<T> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok())
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
