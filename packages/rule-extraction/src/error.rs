//! Typed errors for the rule extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Stage-local parse failures never surface here: the structural validator
//! reports `false`, the schema critic reports an "unparseable output" issue,
//! and the lenient rule parse yields an empty candidate. Only provider
//! failures and the orchestrator's final verdict cross the component
//! boundary as hard errors.

use thiserror::Error;

/// Errors raised by a [`CompletionProvider`](crate::traits::CompletionProvider).
///
/// The pipeline never retries these transparently; retry policy lives in the
/// orchestrator (a single semantic fallback), not at the transport seam.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (connection, TLS, I/O).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The provider itself reported an error.
    #[error("provider error: {message}")]
    Api { message: String },

    /// The named prompt template is not registered.
    #[error("unknown prompt template: {name}")]
    UnknownTemplate { name: String },

    /// The completion was cancelled.
    #[error("completion cancelled")]
    Cancelled,
}

/// Errors that can occur during rule pipeline operations.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Blank or missing required input to a stage; caller's fault, not retried.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Completion provider failure, propagated unchanged.
    #[error("completion provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The pipeline could not produce a structurally valid rule even after
    /// fallback and backfill. Carries critic issues when available.
    #[error("pipeline failed: {message}")]
    Pipeline {
        message: String,
        /// Aggregated human-readable issues, possibly empty.
        issues: Vec<String>,
    },

    /// One element of a multi-rule batch failed validation. The whole batch
    /// aborts; no partial result is returned.
    #[error("rule {index} in batch failed validation: {message}")]
    BatchElement { index: usize, message: String },

    /// Operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Serialization of a validated rule failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuleError {
    /// Pipeline failure with a fixed diagnostic message and no issue list.
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// Pipeline failure carrying aggregated issue text.
    pub fn pipeline_with_issues(message: impl Into<String>, issues: Vec<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
            issues,
        }
    }

    /// Blank-input failure for the named argument.
    pub fn blank_input(argument: &str) -> Self {
        Self::InvalidInput {
            reason: format!("{argument} must not be blank"),
        }
    }
}

/// Result type alias for rule pipeline operations.
pub type Result<T> = std::result::Result<T, RuleError>;
