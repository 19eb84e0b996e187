//! Natural-Language Rule Extraction Library
//!
//! Turns an unreliable, free-form sentence into a structurally validated
//! rule record, using a non-deterministic text-generation provider as a
//! component inside a deterministic pipeline. The provider can return
//! malformed JSON, omit required fields, mangle special characters, or be
//! plain wrong; the pipeline still guarantees that its output either
//! satisfies the rule schema or fails with a diagnosable error.
//!
//! # Design Philosophy
//!
//! **"Trust the model's content, never its structure"**
//!
//! - The provider is an injected capability, not a framework binding
//! - Every parse happens at a stage boundary and degrades, never panics
//! - One semantic retry, then deterministic backfill - no retry loops
//! - Field lookups on model output are case-insensitive, output casing is
//!   canonical
//!
//! # Usage
//!
//! ```rust,ignore
//! use rule_extraction::{RulePipeline, testing::MockProvider};
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = RulePipeline::new(MockProvider::new());
//! let cancel = CancellationToken::new();
//!
//! let rule = pipeline
//!     .extract_rule("If a deckhand works over 12 hours, call the casual pool.", &cancel)
//!     .await?;
//! assert!(rule.has_core_fields());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The completion provider capability
//! - [`types`] - Rule, condition and validation types
//! - [`pipeline`] - Extraction pipeline, backfill, validation, prompts
//! - [`normalize`] - Fixed-point entity decoding
//! - [`provider`] - Credentials and the optional reference backend
//! - [`testing`] - Mock provider for tests

pub mod error;
pub mod json;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ProviderError, Result, RuleError};
pub use traits::{inputs, CompletionProvider, TemplateInputs};
pub use types::{Condition, Logic, PipelineConfig, Rule, ValidationResult};

// Re-export pipeline components
pub use pipeline::{
    // Orchestrator
    RulePipeline,
    // Deterministic stages
    backfill, is_structurally_valid, validate_value,
    // Critic helpers
    filter_ignorable, is_ignorable_issue, parse_critic_response,
    // Prompt registry
    TemplateRegistry,
};

// Re-export the normalizer
pub use normalize::normalize;

// Re-export testing utilities
pub use testing::{MockCall, MockProvider};

#[cfg(feature = "openai")]
pub use provider::OpenAiProvider;
