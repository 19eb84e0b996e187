//! Validation result type shared by the validate operation and the critic.

use serde::{Deserialize, Serialize};

/// Outcome of a validation pass.
///
/// `issues` may be empty even when invalid (e.g. the critic returned
/// unparseable output and the diagnostic is the only context available).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the rule passed.
    pub is_valid: bool,

    /// Ordered human-readable issue strings.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl ValidationResult {
    /// A passing result with no issues.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
        }
    }

    /// A failing result carrying the given issues.
    pub fn invalid(issues: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            is_valid: false,
            issues: issues.into_iter().map(Into::into).collect(),
        }
    }

    /// Prepend an issue, keeping existing order after it.
    pub fn with_leading_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.insert(0, issue.into());
        self
    }
}
