//! OpenAI-backed reference implementation of the completion provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use rule_extraction::provider::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...").with_model("gpt-4o");
//! let pipeline = RulePipeline::new(provider);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::pipeline::prompts::TemplateRegistry;
use crate::provider::credentials::ProviderCredentials;
use crate::traits::{CompletionProvider, TemplateInputs};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions provider.
///
/// Renders built-in templates locally and sends them at temperature 0.
/// One `reqwest::Client` is shared across concurrent pipeline runs.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    credentials: ProviderCredentials,
    templates: TemplateRegistry,
}

impl OpenAiProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            credentials: ProviderCredentials::new(api_key, DEFAULT_MODEL),
            templates: TemplateRegistry::builtin(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| ProviderError::Api {
            message: "OPENAI_API_KEY not set".to_string(),
        })?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.credentials.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.credentials.base_url = Some(url.into());
        self
    }

    /// Replace the template registry (for prompt overrides).
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.credentials.model
    }

    fn base_url(&self) -> &str {
        self.credentials.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    async fn chat(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: self.credentials.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(0.0),
            max_tokens: Some(4096),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url()))
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.expose_key()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                message: format!("OpenAI API error: {error_text}"),
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(Box::new(e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Api {
                message: "no choices in OpenAI response".to_string(),
            })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn invoke(
        &self,
        template: &str,
        inputs: &TemplateInputs,
    ) -> Result<String, ProviderError> {
        let prompt = self.templates.render(template, inputs)?;
        self.chat(&prompt).await
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
