//! Case-insensitive access to provider-returned JSON.
//!
//! Model output does not guarantee key casing (`"Action"`, `"ACTION"`,
//! `"action"` are all seen in the wild), so every lookup in the validator
//! and backfill stages goes through a document whose object keys were
//! lower-cased once after parsing, rather than per-field linear scans.

use serde_json::{Map, Value};

/// Recursively lower-case every object key in a JSON value.
///
/// On duplicate keys after folding (`"Action"` and `"action"`), the last
/// one wins, matching `serde_json`'s own duplicate-key behavior.
pub fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut folded = Map::with_capacity(map.len());
            for (key, val) in map {
                folded.insert(key.to_lowercase(), lowercase_keys(val));
            }
            Value::Object(folded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Parse text as a JSON object with lower-cased keys.
///
/// Returns `None` when the text is not valid JSON or is not an object;
/// callers convert that to a boolean or an empty candidate at the stage
/// boundary instead of propagating a parse error.
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let value: Value = serde_json::from_str(text).ok()?;
    match lowercase_keys(value) {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Read a string field from a lower-cased object, trimmed.
///
/// Returns `None` when the field is absent or not a string.
pub fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).map(str::trim)
}

/// Read a string field, treating blank values as absent.
pub fn non_blank_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    string_field(map, key).filter(|s| !s.is_empty())
}
