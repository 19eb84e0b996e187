//! Testing utilities including a mock completion provider.
//!
//! Useful for testing applications built on the pipeline without making
//! real LLM calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::ProviderError;
use crate::pipeline::prompts;
use crate::traits::{CompletionProvider, TemplateInputs};

/// A mock completion provider with scripted, per-template responses.
///
/// Responses queue per template name: each invocation consumes the next
/// response, and the final one repeats once the queue is down to a single
/// entry (so a scripted retry can see two different answers while simple
/// tests script just one). Templates with no script fall back to a
/// deterministic default. Every call is recorded for assertions.
#[derive(Default)]
pub struct MockProvider {
    /// Scripted responses by template name.
    responses: Arc<RwLock<HashMap<String, VecDeque<String>>>>,

    /// Templates that should fail.
    fail_templates: Arc<RwLock<Vec<String>>>,

    /// Call tracking for assertions.
    calls: Arc<RwLock<Vec<MockCall>>>,
}

/// Record of a call made to the mock provider.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Template name that was invoked.
    pub template: String,

    /// Inputs passed with the invocation.
    pub inputs: TemplateInputs,
}

impl MockCall {
    /// The `input` entry of this call, if present.
    pub fn input(&self) -> Option<&str> {
        self.inputs.get("input").map(String::as_str)
    }
}

impl MockProvider {
    /// Create a new mock provider with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted response for a template.
    pub fn with_response(self, template: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .entry(template.into())
            .or_default()
            .push_back(response.into());
        self
    }

    /// Mark a template as failing.
    pub fn fail_template(self, template: impl Into<String>) -> Self {
        self.fail_templates.write().unwrap().push(template.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().unwrap().clone()
    }

    /// Calls made to a specific template, in order.
    pub fn calls_to(&self, template: &str) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.template == template)
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    /// Default response for templates with no script.
    ///
    /// Repair echoes its input (a passthrough repairer), the critic
    /// approves, and the rest return recognizable placeholders.
    fn default_response(&self, template: &str, inputs: &TemplateInputs) -> String {
        let input = inputs.get("input").map(String::as_str).unwrap_or_default();
        match template {
            prompts::REPAIR_FUNCTION => input.to_string(),
            prompts::SCHEMA_VALIDATOR => r#"{"valid": true, "issues": []}"#.to_string(),
            prompts::SUMMARIZE_PROMPT => format!("Summary: {input}"),
            prompts::RULE_EXPLAINER => format!("This rule covers: {input}"),
            _ => String::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn invoke(
        &self,
        template: &str,
        inputs: &TemplateInputs,
    ) -> Result<String, ProviderError> {
        self.calls.write().unwrap().push(MockCall {
            template: template.to_string(),
            inputs: inputs.clone(),
        });

        if self
            .fail_templates
            .read()
            .unwrap()
            .contains(&template.to_string())
        {
            return Err(ProviderError::Api {
                message: format!("mock failure for template {template}"),
            });
        }

        let mut responses = self.responses.write().unwrap();
        if let Some(queue) = responses.get_mut(template) {
            match queue.len() {
                0 => {}
                1 => return Ok(queue.front().cloned().unwrap_or_default()),
                _ => return Ok(queue.pop_front().unwrap_or_default()),
            }
        }
        drop(responses);

        Ok(self.default_response(template, inputs))
    }
}
