//! Scripted model for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use ragline_core::{
    Content, CoreError, Llm, LlmRequest, LlmResponse, LlmResponseStream, Part, Result,
};
use serde_json::Value;

#[derive(Debug, Clone)]
enum Turn {
    Text(String),
    Calls(Vec<(String, Value)>),
    Fail(String),
}

/// A model that answers from a script and records what it was asked.
///
/// Every call to [`generate_content`](Llm::generate_content) consumes the next
/// scripted turn. In streaming mode a text turn is split after each space, so
/// the fragments concatenate to exactly the blocking answer. Calling past the
/// end of the script is a [`CoreError::Model`].
///
/// # Example
///
/// ```rust
/// use ragline_core::{LlmRequest, generate_text};
/// use ragline_model::MockLlm;
///
/// # futures::executor::block_on(async {
/// let llm = MockLlm::new("mock").with_text("The sky is blue.");
/// let answer = generate_text(&llm, LlmRequest::from_prompt("", "Why?")).await.unwrap();
/// assert_eq!(answer, "The sky is blue.");
/// assert_eq!(llm.requests().len(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<Turn>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), script: Mutex::default(), requests: Mutex::default() }
    }

    /// Queue a plain text answer.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(Turn::Text(text.into()))
    }

    /// Queue a turn in which the model requests a single tool call.
    pub fn with_function_call(self, name: impl Into<String>, args: Value) -> Self {
        self.push(Turn::Calls(vec![(name.into(), args)]))
    }

    /// Queue a turn in which the model requests several tool calls, in order.
    pub fn with_function_calls(self, calls: Vec<(String, Value)>) -> Self {
        self.push(Turn::Calls(calls))
    }

    /// Queue a failing turn.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push(Turn::Fail(message.into()))
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of scripted turns not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn push(self, turn: Turn) -> Self {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(turn);
        self
    }
}

fn complete(content: Content) -> LlmResponse {
    LlmResponse {
        content: Some(content),
        partial: false,
        turn_complete: true,
        finish_reason: Some("stop".into()),
    }
}

fn responses(turn: Turn, stream: bool) -> Result<Vec<Result<LlmResponse>>> {
    match turn {
        Turn::Fail(message) => Err(CoreError::Model(message)),
        Turn::Calls(calls) => {
            let mut content = Content::new("assistant");
            for (i, (name, args)) in calls.into_iter().enumerate() {
                let id = Some(format!("call_{i}"));
                content.parts.push(Part::FunctionCall { name, args, id });
            }
            Ok(vec![Ok(complete(content))])
        }
        Turn::Text(text) if stream => {
            let mut items: Vec<Result<LlmResponse>> = text
                .split_inclusive(' ')
                .map(|fragment| {
                    Ok(LlmResponse {
                        content: Some(Content::assistant(fragment)),
                        partial: true,
                        turn_complete: false,
                        finish_reason: None,
                    })
                })
                .collect();
            items.push(Ok(LlmResponse {
                content: None,
                partial: false,
                turn_complete: true,
                finish_reason: Some("stop".into()),
            }));
            Ok(items)
        }
        Turn::Text(text) => Ok(vec![Ok(complete(Content::assistant(text)))]),
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request);
        let turn = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| CoreError::Model(format!("{}: script exhausted", self.name)))?;

        let items = responses(turn, stream)?;
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::{collect_content, collect_text, generate_text};
    use serde_json::json;

    #[tokio::test]
    async fn streamed_fragments_match_blocking_text() {
        let text = "Rust is a systems language.";
        let llm = MockLlm::new("mock").with_text(text).with_text(text);

        let blocking = generate_text(&llm, LlmRequest::from_prompt("", "q")).await.unwrap();
        let stream = llm.generate_content(LlmRequest::from_prompt("", "q"), true).await.unwrap();
        let streamed = collect_text(stream).await.unwrap();

        assert_eq!(blocking, text);
        assert_eq!(streamed, text);
    }

    #[tokio::test]
    async fn function_calls_carry_ids() {
        let llm = MockLlm::new("mock").with_function_call("multiply", json!({"a": 2, "b": 3}));
        let stream = llm.generate_content(LlmRequest::default(), false).await.unwrap();
        let content = collect_content(stream).await.unwrap();
        let calls: Vec<_> = content.function_calls().collect();
        assert_eq!(calls, [("multiply", &json!({"a": 2, "b": 3}), Some("call_0"))]);
    }

    #[tokio::test]
    async fn exhausted_script_is_a_model_error() {
        let llm = MockLlm::new("mock");
        let err = llm.generate_content(LlmRequest::default(), false).await.err().unwrap();
        assert!(matches!(err, CoreError::Model(_)));
        assert_eq!(llm.requests().len(), 1);
    }
}
