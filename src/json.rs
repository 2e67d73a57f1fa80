//! Lenient field readers over raw data-service rows.
//!
//! Rows arrive as `serde_json::Value` objects. All coercion to typed values
//! happens here, once, right after fetch; missing or wrongly typed fields
//! collapse to `None` rather than failing the request.

use serde_json::Value as JsonValue;

pub fn str_field(row: &JsonValue, key: &str) -> Option<String> {
    row.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn f64_field(row: &JsonValue, key: &str) -> Option<f64> {
    let value = row.get(key)?;
    if let Some(num) = value.as_f64() {
        return Some(num);
    }
    value.as_str().and_then(|s| s.trim().parse::<f64>().ok())
}

pub fn i64_field(row: &JsonValue, key: &str) -> Option<i64> {
    let value = row.get(key)?;
    if let Some(num) = value.as_i64() {
        return Some(num);
    }
    value.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

pub fn bool_field(row: &JsonValue, key: &str) -> bool {
    row.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Ids show up both as numbers and as strings depending on the source table.
pub fn id_field(row: &JsonValue, key: &str) -> Option<String> {
    let value = row.get(key)?;
    if let Some(num) = value.as_i64() {
        return Some(num.to_string());
    }
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
