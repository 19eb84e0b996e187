//! The rule pipeline - main entry point for the library.
//!
//! A [`RulePipeline`] sequences the extraction stages (summarize → extract
//! intent → repair → backfill → validate, with one conditional fallback
//! retry) and exposes the secondary operations (`refine`, `validate`,
//! `explain`, `extract_multiple`, `cluster_rules`).
//!
//! The pipeline is stateless per request: stages hold no mutable state, so
//! concurrent runs share one instance safely. The only shared resource is
//! the injected [`CompletionProvider`], which must itself be safe for
//! concurrent use. Every stage accepts a cancellation token and aborts at
//! the next provider-call boundary.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, RuleError};
use crate::normalize;
use crate::pipeline::{backfill, batch, critic, prompts, validate};
use crate::traits::{inputs, CompletionProvider, TemplateInputs};
use crate::types::{PipelineConfig, Rule, ValidationResult};

/// The rule extraction pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use rule_extraction::{RulePipeline, testing::MockProvider};
/// use tokio_util::sync::CancellationToken;
///
/// let pipeline = RulePipeline::new(MockProvider::new());
/// let rule = pipeline
///     .extract_rule("If a deckhand works over 12 hours, call the casual pool.",
///                   &CancellationToken::new())
///     .await?;
/// ```
pub struct RulePipeline<P: CompletionProvider> {
    provider: P,
    config: PipelineConfig,
}

impl<P: CompletionProvider> RulePipeline<P> {
    /// Create a pipeline with default configuration.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: PipelineConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(provider: P, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get a reference to the injected provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Invoke the provider, racing the call against cancellation.
    ///
    /// This is the single boundary where cancellation takes effect; later
    /// stages never run once the token fires.
    async fn invoke(
        &self,
        template: &str,
        template_inputs: TemplateInputs,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(RuleError::Cancelled);
        }

        debug!(template = %template, "invoking completion provider");
        tokio::select! {
            result = self.provider.invoke(template, &template_inputs) => Ok(result?),
            _ = cancel.cancelled() => Err(RuleError::Cancelled),
        }
    }

    fn normalize(&self, text: &str) -> String {
        normalize::normalize_with_cap(text, self.config.max_decode_passes)
    }

    // =========================================================================
    // Stage wrappers
    // =========================================================================

    /// Summarize source text to enrich grounding context for extraction.
    ///
    /// The summary never replaces the source text; the orchestrator always
    /// passes both.
    pub async fn summarize(&self, text: &str, cancel: &CancellationToken) -> Result<String> {
        require_non_blank(text, "text")?;
        self.invoke(prompts::SUMMARIZE_PROMPT, inputs([("input", text)]), cancel)
            .await
    }

    /// Extract a raw rule-intent string from text.
    ///
    /// Returns the provider output verbatim; it may be malformed JSON,
    /// prose, or empty. Parsing happens downstream.
    pub async fn extract_intent(&self, text: &str, cancel: &CancellationToken) -> Result<String> {
        require_non_blank(text, "text")?;
        self.invoke(prompts::INTENT_EXTRACTOR, inputs([("input", text)]), cancel)
            .await
    }

    /// Best-effort JSON repair.
    ///
    /// Asks the provider to fix the text, then normalizes the result. When
    /// the provider yields nothing usable, falls back to the normalized
    /// input instead of failing - structural problems are caught by
    /// validation, not here.
    pub async fn repair(&self, raw_json: &str, cancel: &CancellationToken) -> Result<String> {
        require_non_blank(raw_json, "raw JSON")?;
        let repaired = self
            .invoke(prompts::REPAIR_FUNCTION, inputs([("input", raw_json)]), cancel)
            .await?;

        let normalized = self.normalize(&repaired);
        if normalized.is_empty() {
            warn!("repair produced no usable output; falling back to normalized input");
            return Ok(self.normalize(raw_json));
        }
        Ok(normalized)
    }

    /// Run the LLM schema critic over rule JSON.
    ///
    /// A soft signal distinct from structural validation: malformed critic
    /// output degrades to an invalid result with a diagnostic issue.
    pub async fn critique(
        &self,
        rule_json: &str,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        require_non_blank(rule_json, "rule JSON")?;
        let response = self
            .invoke(prompts::SCHEMA_VALIDATOR, inputs([("input", rule_json)]), cancel)
            .await?;
        Ok(critic::parse_critic_response(&response))
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Full extraction pipeline: free-form text to a validated [`Rule`].
    ///
    /// Runs summarize → extract intent → repair, retries extraction once
    /// with the bare source text if core fields are missing, backfills the
    /// remainder heuristically, and validates the result. The two-level
    /// fallback (semantic retry, then deterministic backfill) bounds the
    /// worst case instead of looping on an unpredictable model.
    pub async fn extract_rule(&self, text: &str, cancel: &CancellationToken) -> Result<Rule> {
        require_non_blank(text, "text")?;

        let summary = self.summarize(text, cancel).await?;
        let combined = format!("Original:\n{text}\n\nSummary:\n{summary}");
        let mut candidate = self.extract_candidate(&combined, cancel).await?;

        // The only automatic retry: one extraction pass over the bare
        // source text, without the summary.
        if !candidate.has_core_fields() {
            debug!("extracted rule is missing core fields; retrying with bare source text");
            candidate = self.extract_candidate(text, cancel).await?;
        }

        let filled = backfill::backfill(candidate, text);
        if !filled.has_core_fields() {
            return Err(RuleError::pipeline(
                "rule JSON missing required fields after repair",
            ));
        }

        let canonical = filled.to_canonical_json()?;
        if !validate::is_structurally_valid(&canonical) {
            return Err(RuleError::pipeline("rule JSON failed validation"));
        }

        info!(action = %filled.action, target = %filled.target, "extracted rule");
        Ok(filled)
    }

    /// One extract-intent + repair pass, parsed leniently.
    ///
    /// A blank intent string skips repair (whose contract requires
    /// non-blank input) and degrades to an empty candidate, which the
    /// caller's core-fields check turns into the fallback retry.
    async fn extract_candidate(&self, text: &str, cancel: &CancellationToken) -> Result<Rule> {
        let intent = self.extract_intent(text, cancel).await?;
        if intent.trim().is_empty() {
            return Ok(Rule::default());
        }
        let repaired = self.repair(&intent, cancel).await?;
        Ok(Rule::from_provider_output(&repaired))
    }

    /// Refine an already-extracted rule without changing its meaning.
    pub async fn refine(&self, rule_json: &str, cancel: &CancellationToken) -> Result<Rule> {
        require_non_blank(rule_json, "rule JSON")?;

        let repaired = self.repair(rule_json, cancel).await?;
        let refined = self
            .invoke(prompts::REFINE_PROMPT, inputs([("input", &repaired)]), cancel)
            .await?;

        let normalized = self.normalize(&refined);
        if !validate::is_structurally_valid(&normalized) {
            return Err(RuleError::pipeline("refined rule JSON failed validation"));
        }
        Ok(Rule::from_provider_output(&normalized))
    }

    /// Validate rule JSON: deterministic structural check plus the LLM
    /// critic's soft verdict, combined into one result.
    pub async fn validate(
        &self,
        rule_json: &str,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        require_non_blank(rule_json, "rule JSON")?;

        let structural = validate::is_structurally_valid(rule_json);
        let mut result = self.critique(rule_json, cancel).await?;
        if self.config.filter_ignorable_issues {
            result = critic::filter_ignorable(result);
        }

        if !structural {
            result.is_valid = false;
            result = result.with_leading_issue("rule JSON failed structural validation");
        }
        Ok(result)
    }

    /// Explain a rule in plain language.
    pub async fn explain(&self, rule_json: &str, cancel: &CancellationToken) -> Result<String> {
        require_non_blank(rule_json, "rule JSON")?;
        let response = self
            .invoke(prompts::RULE_EXPLAINER, inputs([("input", rule_json)]), cancel)
            .await?;

        let explanation = response.trim();
        if explanation.is_empty() {
            return Err(RuleError::pipeline("explainer returned an empty response"));
        }
        Ok(explanation.to_string())
    }

    /// Extract every distinct rule from a text in one pass.
    ///
    /// Each element of the provider's batch is independently repaired and
    /// structurally validated; the first invalid element aborts the whole
    /// batch. No partial batch is ever returned - silently dropping rules
    /// is worse than failing loudly.
    pub async fn extract_multiple(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Rule>> {
        require_non_blank(text, "text")?;

        let response = self
            .invoke(prompts::MULTI_RULE_EXTRACTOR, inputs([("input", text)]), cancel)
            .await?;
        let Some(elements) = batch::parse_multi_rule_response(&response) else {
            return Err(RuleError::pipeline("multi-rule response was not parseable"));
        };

        let mut rules = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let raw = serde_json::to_string(element)?;
            let repaired = self.repair(&raw, cancel).await?;
            if !validate::is_structurally_valid(&repaired) {
                return Err(RuleError::BatchElement {
                    index,
                    message: "rule JSON failed validation".to_string(),
                });
            }
            rules.push(Rule::from_provider_output(&repaired));
        }

        info!(count = rules.len(), "extracted rule batch");
        Ok(rules)
    }

    /// Cluster an already-extracted rule set.
    ///
    /// Passthrough of the provider's clustering output; fails only when
    /// the response is blank.
    pub async fn cluster_rules(
        &self,
        rules_json: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        require_non_blank(rules_json, "rules JSON")?;
        let response = self
            .invoke(prompts::RULE_CLUSTERER, inputs([("input", rules_json)]), cancel)
            .await?;

        if response.trim().is_empty() {
            return Err(RuleError::pipeline("clusterer returned an empty response"));
        }
        Ok(response)
    }
}

fn require_non_blank(value: &str, argument: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RuleError::blank_input(argument));
    }
    Ok(())
}
