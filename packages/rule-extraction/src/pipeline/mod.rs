//! Rule extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Summarization for grounding context
//! - Intent extraction (raw, possibly malformed JSON)
//! - Best-effort JSON repair with a non-failing fallback
//! - One semantic retry with the bare source text
//! - Deterministic heuristic backfill of missing fields
//! - Structural validation, plus an LLM critic as a soft signal

pub mod backfill;
pub mod batch;
pub mod critic;
pub mod engine;
pub mod prompts;
pub mod validate;

pub use backfill::{backfill, infer_action, infer_conditions, infer_target};
pub use batch::parse_multi_rule_response;
pub use critic::{filter_ignorable, is_ignorable_issue, parse_critic_response};
pub use engine::RulePipeline;
pub use prompts::TemplateRegistry;
pub use validate::{is_structurally_valid, validate_value};
