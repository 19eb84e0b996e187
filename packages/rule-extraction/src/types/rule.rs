//! The rule data model - the canonical output of the extraction pipeline.
//!
//! Rules and conditions are value types: no identity beyond their content,
//! created by the pipeline and consumed immediately by the validator and
//! backfill stages. The pipeline never interprets `action`, `target` or the
//! condition fields; it only requires them structurally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json;

/// Default priority when the provider omits it or emits something
/// unparsable.
pub const DEFAULT_PRIORITY: i32 = 1;

/// The canonical output entity of the pipeline.
///
/// Keys are read case-insensitively from provider output but written in one
/// fixed casing (camelCase) when the pipeline serializes a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Imperative verb phrase (required, non-empty once complete).
    #[serde(default)]
    pub action: String,

    /// Subject or object the action applies to (required, non-empty once
    /// complete).
    #[serde(default)]
    pub target: String,

    /// Ordered condition list. A complete rule has at least one entry with
    /// all three sub-fields non-empty.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Free-form time range; `None` when absent or blank.
    #[serde(default)]
    pub time_range: Option<String>,

    /// Rule priority; defaults to 1 when absent or unparsable.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// How conditions combine. Anything other than `OR` normalizes to `AND`.
    #[serde(default)]
    pub logic: Logic,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            action: String::new(),
            target: String::new(),
            conditions: Vec::new(),
            time_range: None,
            priority: DEFAULT_PRIORITY,
            logic: Logic::And,
        }
    }
}

impl Rule {
    /// Check the completeness invariant: non-blank action and target, and
    /// at least one structurally complete condition.
    ///
    /// This single predicate drives both the orchestrator's fallback retry
    /// and the post-backfill re-check.
    pub fn has_core_fields(&self) -> bool {
        !self.action.trim().is_empty()
            && !self.target.trim().is_empty()
            && self.conditions.iter().any(Condition::is_complete)
    }

    /// Leniently parse provider output into a rule candidate.
    ///
    /// Total: unparseable text, a non-object payload, wrong-typed fields and
    /// missing fields all degrade to defaults rather than erroring. Key
    /// lookup is case-insensitive at every level. Completeness is judged
    /// afterwards by [`Rule::has_core_fields`].
    pub fn from_provider_output(text: &str) -> Self {
        match json::parse_object(text) {
            Some(map) => Self::from_lowercased_map(&map),
            None => Self::default(),
        }
    }

    fn from_lowercased_map(map: &serde_json::Map<String, Value>) -> Self {
        let conditions = map
            .get("conditions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(Condition::from_lowercased_map)
                    .collect()
            })
            .unwrap_or_default();

        // camelCase folds to "timerange"; snake_case providers send
        // "time_range".
        let time_range = json::non_blank_field(map, "timerange")
            .or_else(|| json::non_blank_field(map, "time_range"))
            .map(str::to_string);

        Self {
            action: json::string_field(map, "action").unwrap_or_default().to_string(),
            target: json::string_field(map, "target").unwrap_or_default().to_string(),
            conditions,
            time_range,
            priority: parse_priority(map.get("priority")),
            logic: map
                .get("logic")
                .and_then(Value::as_str)
                .map(Logic::parse_lenient)
                .unwrap_or_default(),
        }
    }

    /// Serialize with the canonical camelCase key set.
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn parse_priority(value: Option<&Value>) -> i32 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(DEFAULT_PRIORITY),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_PRIORITY),
        _ => DEFAULT_PRIORITY,
    }
}

/// One field/operator/value triple inside a rule's condition list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl Condition {
    /// Create a new condition.
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// All three sub-fields non-blank.
    pub fn is_complete(&self) -> bool {
        !self.field.trim().is_empty()
            && !self.operator.trim().is_empty()
            && !self.value.trim().is_empty()
    }

    fn from_lowercased_map(map: &serde_json::Map<String, Value>) -> Self {
        Self {
            field: json::string_field(map, "field").unwrap_or_default().to_string(),
            operator: json::string_field(map, "operator").unwrap_or_default().to_string(),
            value: condition_value(map),
        }
    }
}

/// Condition values are strings in the schema, but models frequently emit
/// bare numbers ("value": 12); accept those rather than dropping the
/// condition.
fn condition_value(map: &serde_json::Map<String, Value>) -> String {
    match map.get("value") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// How a rule's conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Logic {
    /// All conditions must hold.
    #[default]
    #[serde(rename = "AND")]
    And,

    /// Any condition may hold.
    #[serde(rename = "OR")]
    Or,
}

impl Logic {
    /// Lenient normalization: a case-insensitive `"or"` yields [`Logic::Or`];
    /// every other value, including garbage, yields [`Logic::And`].
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("or") {
            Self::Or
        } else {
            Self::And
        }
    }
}
