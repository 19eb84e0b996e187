//! Multi-rule batch payload parsing.
//!
//! The multi-rule extractor returns `{"rules": [...]}`. Parsing is
//! case-insensitive like everything else read from the provider; each
//! element is handed back as a raw value so the engine can repair and
//! validate it independently.

use serde_json::Value;

use crate::json;

/// Parse a multi-rule response into its raw rule elements.
///
/// Returns `None` when the payload is not an object or has no `rules`
/// array; the engine converts that to a pipeline failure (silent empty
/// batches are disallowed). An empty `rules` array is a valid, empty
/// batch.
pub fn parse_multi_rule_response(text: &str) -> Option<Vec<Value>> {
    let map = json::parse_object(text)?;
    map.get("rules").and_then(Value::as_array).cloned()
}
