use ragline_core::{GenerateContentConfig, LlmRequest};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Knobs shared by every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model name sent with each request; empty uses the client's own model.
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i32>,
    /// Tool-call rounds before the tool-calling agent asks for a final answer.
    pub max_tool_rounds: usize,
    /// Sub-questions kept from the decomposition step.
    pub max_sub_questions: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: Some(0.0),
            max_output_tokens: None,
            max_tool_rounds: 1,
            max_sub_questions: 5,
        }
    }
}

impl AgentConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: i32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_max_sub_questions(mut self, n: usize) -> Self {
        self.max_sub_questions = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            if !t.is_finite() || t < 0.0 {
                return Err(AgentError::Config(format!(
                    "temperature must be a non-negative number, got {t}"
                )));
            }
        }
        if matches!(self.max_output_tokens, Some(n) if n <= 0) {
            return Err(AgentError::Config("max_output_tokens must be positive".into()));
        }
        if self.max_sub_questions == 0 {
            return Err(AgentError::Config("max_sub_questions must be at least 1".into()));
        }
        Ok(())
    }

    pub(crate) fn generation_config(&self) -> GenerateContentConfig {
        GenerateContentConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            ..Default::default()
        }
    }

    /// A request for `contents` carrying the configured model and sampling knobs.
    pub(crate) fn request(&self, contents: Vec<ragline_core::Content>) -> LlmRequest {
        LlmRequest::new(self.model.clone(), contents).with_config(self.generation_config())
    }
}
