//! Configuration for the rule extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::normalize::DEFAULT_MAX_DECODE_PASSES;

/// Configuration for the rule extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Safety cap on the normalizer's entity-decoding loop.
    ///
    /// Termination is already guaranteed by fixed-point equality; the cap
    /// guards against a decoder bug producing a non-converging cycle.
    /// Default: 10.
    pub max_decode_passes: usize,

    /// Drop critic issues that only flag artifacts the normalizer already
    /// fixed (HTML entities, `&quot;` residue, "invalid characters",
    /// "not properly formatted"). A result whose issues are all ignorable
    /// is promoted to valid.
    ///
    /// Default: true.
    pub filter_ignorable_issues: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_decode_passes: DEFAULT_MAX_DECODE_PASSES,
            filter_ignorable_issues: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decode-pass safety cap.
    pub fn with_max_decode_passes(mut self, passes: usize) -> Self {
        self.max_decode_passes = passes;
        self
    }

    /// Enable or disable the ignorable-issue filter.
    pub fn with_ignorable_issue_filter(mut self, enabled: bool) -> Self {
        self.filter_ignorable_issues = enabled;
        self
    }
}
