//! LLM schema critic response handling.
//!
//! The critic is a soft validation signal: a boolean verdict plus
//! human-readable issues, distinct from the deterministic structural
//! validator. Its JSON contract (`{"valid": bool, "issues": [...]}`) is
//! case-sensitive; malformed output degrades to an invalid result with a
//! diagnostic issue rather than an error.

use serde::Deserialize;

use crate::types::ValidationResult;

/// Diagnostic issue used when the critic's output cannot be parsed.
pub const UNPARSEABLE_ISSUE: &str = "validator returned unparseable output";

/// Issue substrings that flag artifacts the normalizer already fixed.
///
/// A critic complaining about entity residue or formatting is reporting a
/// symptom the pipeline has already handled upstream.
const IGNORABLE_ISSUE_MARKERS: &[&str] = &[
    "html entities",
    "&quot;",
    "invalid characters",
    "not properly formatted",
];

#[derive(Debug, Deserialize)]
struct CriticResponse {
    valid: bool,
    #[serde(default)]
    issues: Vec<String>,
}

/// Parse the critic's raw response into a [`ValidationResult`].
///
/// Keys are matched case-sensitively (the critic prompt pins the casing);
/// anything unparseable yields an invalid result with
/// [`UNPARSEABLE_ISSUE`].
pub fn parse_critic_response(text: &str) -> ValidationResult {
    match serde_json::from_str::<CriticResponse>(text) {
        Ok(response) => ValidationResult {
            is_valid: response.valid,
            issues: response.issues,
        },
        Err(_) => ValidationResult::invalid([UNPARSEABLE_ISSUE]),
    }
}

/// Whether an issue belongs to a known false-positive class.
pub fn is_ignorable_issue(issue: &str) -> bool {
    let lowered = issue.to_lowercase();
    IGNORABLE_ISSUE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Promote a result to valid when every reported issue is ignorable.
///
/// An invalid result with an empty issue list is NOT promoted: the critic
/// gave a verdict without symptoms, and there is nothing to discount.
pub fn filter_ignorable(result: ValidationResult) -> ValidationResult {
    if result.is_valid {
        return result;
    }
    if !result.issues.is_empty() && result.issues.iter().all(|i| is_ignorable_issue(i)) {
        return ValidationResult::valid();
    }
    result
}
