//! Ollama provider for local models.
//!
//! Talks to the `/api/chat` endpoint of an Ollama server. Supports:
//!
//! - **Blocking and streaming** generation (NDJSON, one object per line)
//! - **Tool calling** via the `tools` request field
//! - **Structured output** via the `format` field, fed from
//!   `GenerateContentConfig::response_schema`
//!
//! # Example
//!
//! ```rust,ignore
//! use ragline_model::ollama::{OllamaClient, OllamaConfig};
//!
//! let model = OllamaClient::new(OllamaConfig::new("llama3.2"))?;
//! let answer = ragline_core::generate_text(&model, LlmRequest::from_prompt("", "Hi")).await?;
//! ```

mod client;
mod config;
mod convert;

pub use client::OllamaClient;
pub use config::{OLLAMA_DEFAULT_BASE_URL, OLLAMA_DEFAULT_MODEL, OllamaConfig};
