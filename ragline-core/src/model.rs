//! The generation-model collaborator boundary.
//!
//! A model is handed a complete request and answers with a lazy stream of
//! [`LlmResponse`]s. In blocking mode the stream yields exactly one complete
//! response; in streaming mode it yields partial text increments that the
//! caller concatenates in arrival order. Either way the stream is finite,
//! consumed by a single reader, and ends with a response carrying
//! `turn_complete = true` or with an error.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::types::{Content, Part};

/// A boxed stream of model responses.
pub type LlmResponseStream = Pin<Box<dyn Stream<Item = Result<LlmResponse>> + Send>>;

/// A generation model endpoint.
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model identifier, e.g. `llama3.2`.
    fn name(&self) -> &str;

    /// Send `request` to the model.
    ///
    /// With `stream == false` the returned stream yields a single complete
    /// response. With `stream == true` it yields partial increments.
    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream>;
}

/// Pass-through sampling knobs. None of these are interpreted locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,
    /// JSON schema the model output must conform to (structured output).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// A tool the model may call, as advertised in a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A request to a generation model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateContentConfig>,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self { model: model.into(), contents, tools: Vec::new(), config: None }
    }

    /// Build a request holding a single user prompt.
    pub fn from_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(model, vec![Content::user(prompt)])
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_config(mut self, config: GenerateContentConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// One item of a model response stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Option<Content>,
    /// `true` for an incremental fragment of a streamed answer.
    pub partial: bool,
    /// `true` on the last item of the stream.
    pub turn_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// Text carried by this response, empty if none.
    pub fn text(&self) -> String {
        self.content.as_ref().map(Content::text).unwrap_or_default()
    }
}

/// Drain a response stream and concatenate its text in arrival order.
pub async fn collect_text(mut stream: LlmResponseStream) -> Result<String> {
    let mut out = String::new();
    while let Some(item) = stream.next().await {
        out.push_str(&item?.text());
    }
    Ok(out)
}

/// Drain a response stream into a single assistant message.
///
/// Text fragments are concatenated in order; tool calls are kept in the order
/// they arrived.
pub async fn collect_content(mut stream: LlmResponseStream) -> Result<Content> {
    let mut merged = Content::new("assistant");
    let mut text = String::new();
    let mut calls = Vec::new();
    while let Some(item) = stream.next().await {
        let Some(content) = item?.content else { continue };
        for part in content.parts {
            match part {
                Part::Text { text: t } => text.push_str(&t),
                other => calls.push(other),
            }
        }
    }
    if !text.is_empty() {
        merged.parts.push(Part::Text { text });
    }
    merged.parts.extend(calls);
    Ok(merged)
}

/// Run a blocking (non-streaming) generation and return the full text.
pub async fn generate_text(llm: &dyn Llm, request: LlmRequest) -> Result<String> {
    let stream = llm.generate_content(request, false).await?;
    collect_text(stream).await
}

/// Run a blocking generation and parse its text as JSON of type `T`.
///
/// Used for structured output. Malformed output is a [`CoreError::Model`].
pub async fn generate_json<T: serde::de::DeserializeOwned>(
    llm: &dyn Llm,
    request: LlmRequest,
) -> Result<T> {
    let text = generate_text(llm, request).await?;
    serde_json::from_str(text.trim())
        .map_err(|e| CoreError::Model(format!("malformed structured output: {e}")))
}
