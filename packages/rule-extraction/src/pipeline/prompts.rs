//! LLM prompts for the rule extraction pipeline.
//!
//! Template names and bodies form an immutable, in-process registry built
//! once at startup. The pipeline addresses templates by name; providers
//! render them. There is no filesystem discovery.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::error::ProviderError;
use crate::traits::TemplateInputs;

/// Template name: summarize source text for grounding context.
pub const SUMMARIZE_PROMPT: &str = "SummarizePrompt";

/// Template name: extract a rule intent as JSON.
pub const INTENT_EXTRACTOR: &str = "IntentExtractor";

/// Template name: repair malformed JSON.
pub const REPAIR_FUNCTION: &str = "RepairFunction";

/// Template name: soft schema validation with issue list.
pub const SCHEMA_VALIDATOR: &str = "SchemaValidator";

/// Template name: refine an existing rule.
pub const REFINE_PROMPT: &str = "RefinePrompt";

/// Template name: explain a rule in plain language.
pub const RULE_EXPLAINER: &str = "RuleExplainer";

/// Template name: cluster a set of rules.
pub const RULE_CLUSTERER: &str = "RuleClusterer";

/// Template name: extract several rules in one pass.
pub const MULTI_RULE_EXTRACTOR: &str = "MultiRuleExtractor";

/// Prompt for summarizing source text before extraction.
pub const SUMMARIZE_TEMPLATE: &str = r#"Summarize this workplace policy statement in 1-2 sentences.

Focus on:
1. WHO the statement applies to
2. WHAT should happen
3. WHEN or under which conditions it applies

Statement:
{input}"#;

/// Prompt for extracting a single rule as JSON.
pub const INTENT_EXTRACTOR_TEMPLATE: &str = r#"Extract a scheduling/policy rule from this text.

Text:
{input}

Rules:
1. "action" is an imperative verb phrase (e.g. "notify", "grant_time_off")
2. "target" is who or what the action applies to
3. Every condition needs all of "field", "operator" and "value"
4. Do NOT invent conditions that are not in the text
5. Output ONLY the JSON object, no commentary

Output JSON:
{
    "action": "verb phrase",
    "target": "subject",
    "conditions": [
        {"field": "hours_worked", "operator": "greater_than", "value": "12"}
    ],
    "timeRange": "free-form time range or null",
    "priority": 1,
    "logic": "AND" | "OR"
}"#;

/// Prompt for repairing malformed JSON.
pub const REPAIR_TEMPLATE: &str = r#"The following text is supposed to be a single valid JSON object but may be malformed.

Fix it:
1. Remove any commentary, markdown fences, or trailing prose
2. Quote unquoted keys, close unclosed brackets and strings
3. Decode HTML entities (&quot;, &amp;) into the characters they stand for
4. Preserve every field and value that is already there; add nothing new

Text:
{input}

Output ONLY the repaired JSON object."#;

/// Prompt for the soft schema critic.
pub const SCHEMA_VALIDATOR_TEMPLATE: &str = r#"Check this rule JSON against the expected schema.

Expected shape: an object with non-empty string "action", non-empty string
"target", and a non-empty "conditions" array where every entry has
non-empty "field", "operator" and "value" strings. "timeRange", "priority"
and "logic" are optional.

Rule JSON:
{input}

Output JSON:
{
    "valid": true | false,
    "issues": ["one short sentence per problem found"]
}"#;

/// Prompt for refining an already-extracted rule.
pub const REFINE_TEMPLATE: &str = r#"Improve this extracted rule without changing its meaning.

Rule JSON:
{input}

Rules:
1. Make "action" a concise imperative verb phrase
2. Canonicalize "target" to a snake_case noun
3. Keep every condition; tighten vague operators where the value makes the intent clear
4. Output ONLY the improved JSON object with the same keys"#;

/// Prompt for explaining a rule in plain language.
pub const RULE_EXPLAINER_TEMPLATE: &str = r#"Explain this rule in plain language for a scheduling manager.

Rule JSON:
{input}

Write 2-3 sentences: what triggers the rule, who it affects, and what happens."#;

/// Prompt for clustering an extracted rule set.
pub const RULE_CLUSTERER_TEMPLATE: &str = r#"Group these rules into clusters of related intent.

Rules JSON:
{input}

For each cluster give a short label and the indexes of its rules.

Output JSON:
{
    "clusters": [
        {"label": "overtime handling", "rules": [0, 2]}
    ]
}"#;

/// Prompt for extracting several rules in one pass.
pub const MULTI_RULE_EXTRACTOR_TEMPLATE: &str = r#"Extract EVERY distinct scheduling/policy rule from this text.

Text:
{input}

Rules:
1. One entry per distinct rule; do not merge unrelated statements
2. Each entry uses the same shape as single-rule extraction
3. Output ONLY the JSON object

Output JSON:
{
    "rules": [
        {
            "action": "verb phrase",
            "target": "subject",
            "conditions": [
                {"field": "day_of_week", "operator": "equals", "value": "monday"}
            ],
            "timeRange": null,
            "priority": 1,
            "logic": "AND"
        }
    ]
}"#;

/// Immutable mapping from template name to template body.
///
/// Constructed once at process start and shared; the pipeline treats it as
/// configuration, never as mutable state.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: IndexMap<String, String>,
}

impl TemplateRegistry {
    /// Registry with the eight built-in pipeline templates.
    pub fn builtin() -> Self {
        let mut templates = IndexMap::new();
        for (name, body) in [
            (SUMMARIZE_PROMPT, SUMMARIZE_TEMPLATE),
            (INTENT_EXTRACTOR, INTENT_EXTRACTOR_TEMPLATE),
            (REPAIR_FUNCTION, REPAIR_TEMPLATE),
            (SCHEMA_VALIDATOR, SCHEMA_VALIDATOR_TEMPLATE),
            (REFINE_PROMPT, REFINE_TEMPLATE),
            (RULE_EXPLAINER, RULE_EXPLAINER_TEMPLATE),
            (RULE_CLUSTERER, RULE_CLUSTERER_TEMPLATE),
            (MULTI_RULE_EXTRACTOR, MULTI_RULE_EXTRACTOR_TEMPLATE),
        ] {
            templates.insert(name.to_string(), body.to_string());
        }
        Self { templates }
    }

    /// Registry from explicit name/body pairs (for overrides in tests or
    /// alternate deployments).
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            templates: pairs
                .into_iter()
                .map(|(name, body)| (name.into(), body.into()))
                .collect(),
        }
    }

    /// Look up a template body by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Registered template names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Render the named template, substituting `{key}` for each input.
    pub fn render(&self, name: &str, inputs: &TemplateInputs) -> Result<String, ProviderError> {
        let body = self.get(name).ok_or_else(|| ProviderError::UnknownTemplate {
            name: name.to_string(),
        })?;

        let mut rendered = body.to_string();
        for (key, value) in inputs {
            rendered = rendered.replace(&format!("{{{key}}}"), value);
        }
        Ok(rendered)
    }

    /// SHA-256 hex of a template body, for cache invalidation.
    pub fn template_hash(&self, name: &str) -> Option<String> {
        self.get(name).map(|body| {
            let mut hasher = Sha256::new();
            hasher.update(body.as_bytes());
            format!("{:x}", hasher.finalize())
        })
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
