//! Configuration for the Ollama chat client.

use ragline_core::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Default Ollama server address.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default chat model.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2";

/// Connection settings for an Ollama server.
///
/// # Example
///
/// ```rust
/// use ragline_model::ollama::OllamaConfig;
///
/// let config = OllamaConfig::new("llama3.2").with_base_url("http://gpu-box:11434");
/// assert_eq!(config.model, "llama3.2");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server address, without the `/api` suffix.
    pub base_url: String,
    /// Model name as known to the server (`ollama list`).
    pub model: String,
    /// How long the server keeps the model loaded after a request, e.g. `"5m"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(OLLAMA_DEFAULT_MODEL)
    }
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: OLLAMA_DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            keep_alive: None,
        }
    }

    /// Read `OLLAMA_BASE_URL` and `OLLAMA_MODEL`, falling back to the defaults.
    pub fn from_env() -> Self {
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| OLLAMA_DEFAULT_MODEL.into());
        let mut config = Self::new(model);
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(CoreError::Config("Ollama model name must not be empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "Ollama base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// The chat endpoint URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_ignores_trailing_slash() {
        let config = OllamaConfig::new("m").with_base_url("http://host:11434/");
        assert_eq!(config.chat_url(), "http://host:11434/api/chat");
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(matches!(OllamaConfig::new(" ").validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn base_url_needs_scheme() {
        let config = OllamaConfig::new("m").with_base_url("localhost:11434");
        assert!(config.validate().is_err());
        assert!(OllamaConfig::default().validate().is_ok());
    }
}
