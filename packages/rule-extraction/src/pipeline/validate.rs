//! Deterministic structural validation of rule JSON.
//!
//! Local, no provider call, never mutates its input. The predicate is
//! boolean; human-readable issue lists come from the LLM critic, not from
//! here. Parse failures are converted to `false` at this boundary instead
//! of propagating.

use serde_json::{Map, Value};

use crate::json;

/// Check rule JSON text against the required shape.
///
/// Requirements (keys case-insensitive at every level):
/// - parses as a JSON object
/// - `action` and `target` are non-blank strings
/// - `conditions` is a non-empty array in which every element is an object
///   with non-blank string `field`, `operator` and `value`
///
/// Everything else (`timeRange`, `priority`, `logic`) is optional here.
pub fn is_structurally_valid(rule_json: &str) -> bool {
    match json::parse_object(rule_json) {
        Some(map) => validate_object(&map),
        None => false,
    }
}

/// [`is_structurally_valid`] over an already-parsed value.
///
/// The value's keys are lower-cased here, so callers may pass raw provider
/// output as well as canonical documents.
pub fn validate_value(value: &Value) -> bool {
    match json::lowercase_keys(value.clone()) {
        Value::Object(map) => validate_object(&map),
        _ => false,
    }
}

fn validate_object(map: &Map<String, Value>) -> bool {
    if json::non_blank_field(map, "action").is_none() {
        return false;
    }
    if json::non_blank_field(map, "target").is_none() {
        return false;
    }

    let Some(conditions) = map.get("conditions").and_then(Value::as_array) else {
        return false;
    };
    if conditions.is_empty() {
        return false;
    }

    conditions.iter().all(|entry| {
        entry.as_object().is_some_and(|condition| {
            ["field", "operator", "value"]
                .into_iter()
                .all(|key| json::non_blank_field(condition, key).is_some())
        })
    })
}
