//! Completion provider trait - the LLM seam of the pipeline.
//!
//! The pipeline treats text generation as an opaque capability: given a
//! named prompt template and a flat string-keyed input mapping, produce a
//! string or fail. Implementations wrap specific backends (OpenAI,
//! Anthropic, a scripted mock) and own template rendering; the pipeline
//! never sees the wire protocol.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ProviderError;

/// Flat string-keyed inputs for a prompt template.
pub type TemplateInputs = HashMap<String, String>;

/// Build [`TemplateInputs`] from key/value pairs.
pub fn inputs<const N: usize>(pairs: [(&str, &str); N]) -> TemplateInputs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Completion provider capability.
///
/// Must be safe for concurrent use: multiple in-flight pipeline runs share
/// one provider instance. The pipeline never retries an invocation
/// transparently; its only retry is the single semantic fallback in the
/// orchestrator.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Render the named template with the given inputs and generate text.
    ///
    /// Returns the generated string verbatim; the caller normalizes and
    /// parses. Fails with [`ProviderError`] on transport errors,
    /// provider-side errors, unknown templates, or cancellation.
    async fn invoke(
        &self,
        template: &str,
        inputs: &TemplateInputs,
    ) -> Result<String, ProviderError>;
}
