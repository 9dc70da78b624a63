//! # ragline-model
//!
//! Generation model clients for ragline.
//!
//! ## Overview
//!
//! - [`OllamaClient`] - a local Ollama server, blocking or streaming
//! - [`MockLlm`] - scripted answers for tests
//!
//! Both implement [`ragline_core::Llm`]. Use [`ragline_core::generate_text`]
//! for a blocking answer or [`ragline_core::collect_text`] to drain a stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragline_core::{Llm, LlmRequest, collect_text};
//! use ragline_model::OllamaClient;
//!
//! let model = OllamaClient::from_env()?;
//! let request = LlmRequest::from_prompt("", "Why is the sky blue?");
//! let stream = model.generate_content(request, true).await?;
//! print!("{}", collect_text(stream).await?);
//! ```
//!
//! ## Features
//!
//! - `ollama` (default) - the Ollama HTTP client

pub mod mock;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use mock::MockLlm;
#[cfg(feature = "ollama")]
pub use ollama::{OllamaClient, OllamaConfig};
