//! Ollama embedding provider using the local `/api/embed` endpoint.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default embedding model.
pub const DEFAULT_MODEL: &str = "mxbai-embed-large";

/// The dimensionality of `mxbai-embed-large`.
pub const DEFAULT_DIMENSIONS: usize = 1024;

const PROVIDER: &str = "Ollama";

/// An [`EmbeddingProvider`] backed by a local Ollama server.
///
/// Uses `reqwest` to call `POST {base_url}/api/embed` directly. The model must
/// already be pulled (`ollama pull mxbai-embed-large`).
///
/// # Configuration
///
/// - `base_url` – defaults to `http://localhost:11434`, or `OLLAMA_BASE_URL`.
/// - `model` – defaults to `mxbai-embed-large`, or `OLLAMA_EMBED_MODEL`.
/// - `dimensions` – must match the model; every response is checked against it.
///
/// # Example
///
/// ```rust,ignore
/// use ragline_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("http://localhost:11434")?
///     .with_model("nomic-embed-text", 768);
/// let embedding = provider.embed("hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a provider talking to the Ollama server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .and_then(|base| base.join("api/embed"))
            .map_err(|e| {
                RagError::ConfigError(format!("invalid Ollama base URL '{base_url}': {e}"))
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a provider from `OLLAMA_BASE_URL` / `OLLAMA_EMBED_MODEL` /
    /// `OLLAMA_EMBED_DIMENSIONS`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut provider = Self::new(&base_url)?;
        if let Ok(model) = std::env::var("OLLAMA_EMBED_MODEL") {
            let dimensions = match std::env::var("OLLAMA_EMBED_DIMENSIONS") {
                Ok(raw) => raw.parse().map_err(|_| {
                    RagError::ConfigError(format!("OLLAMA_EMBED_DIMENSIONS is not a number: {raw}"))
                })?,
                Err(_) => provider.dimensions,
            };
            provider = provider.with_model(model, dimensions);
        }
        Ok(provider)
    }

    /// Set the model name and the dimensionality it produces.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    fn error(message: String) -> RagError {
        RagError::EmbeddingError { provider: PROVIDER.into(), message }
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbedRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(Self::error(format!("API returned {status}: {detail}")));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::error(format!("failed to parse response: {e}"))
        })?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(Self::error(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embed_response.embeddings.len()
            )));
        }
        if let Some(bad) = embed_response.embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(Self::error(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.model,
                bad.len(),
                self.dimensions
            )));
        }

        Ok(embed_response.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
