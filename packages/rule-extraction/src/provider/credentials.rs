//! Credential handling with secure memory.
//!
//! API keys live in `secrecy`-wrapped storage so they cannot leak through
//! logs, `Debug` output, or error messages.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Connection settings for a completion backend.
///
/// The key is only readable through [`ProviderCredentials::expose_key`],
/// which keeps accidental formatting from printing it.
pub struct ProviderCredentials {
    api_key: SecretString,

    /// Model identifier sent with each request.
    pub model: String,

    /// API base URL override (proxies, Azure, local gateways).
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    /// Create credentials for the given key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: model.into(),
            base_url: None,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Expose the API key for use in a request.
    ///
    /// Only call this at the point the key goes on the wire.
    pub fn expose_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

// SecretBox<str> has no Clone of its own; re-wrap the exposed key.
impl Clone for ProviderCredentials {
    fn clone(&self) -> Self {
        Self {
            api_key: SecretString::from(self.expose_key().to_string()),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
