//! Conversion between ragline content types and the Ollama chat wire format.

use ragline_core::{Content, GenerateContentConfig, LlmResponse, Part, ToolDeclaration};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireToolCall {
    pub function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: ToolDeclaration,
}

/// One response object; a full reply in blocking mode, one NDJSON line when
/// streaming.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Flatten one [`Content`] into chat messages.
///
/// Text and tool calls share a message; every tool response becomes its own
/// `tool` message.
pub(crate) fn content_to_messages(content: &Content) -> Vec<ChatMessage> {
    let mut head = ChatMessage { role: content.role.clone(), ..Default::default() };
    let mut responses = Vec::new();

    for part in &content.parts {
        match part {
            Part::Text { text } => head.content.push_str(text),
            Part::FunctionCall { name, args, .. } => head.tool_calls.push(WireToolCall {
                function: WireFunctionCall { name: name.clone(), arguments: args.clone() },
            }),
            Part::FunctionResponse { name, response, .. } => responses.push(ChatMessage {
                role: "tool".into(),
                content: match response {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                tool_calls: Vec::new(),
                tool_name: Some(name.clone()),
            }),
        }
    }

    let mut messages = Vec::with_capacity(responses.len() + 1);
    if !head.content.is_empty() || !head.tool_calls.is_empty() || responses.is_empty() {
        messages.push(head);
    }
    messages.extend(responses);
    messages
}

pub(crate) fn convert_tools(tools: &[ToolDeclaration]) -> Vec<WireTool> {
    tools.iter().map(|t| WireTool { kind: "function", function: t.clone() }).collect()
}

/// Map the sampling knobs onto Ollama `options`; `response_schema` is returned
/// separately because it goes to the top-level `format` field.
pub(crate) fn convert_config(
    config: Option<&GenerateContentConfig>,
) -> (Map<String, Value>, Option<Value>) {
    let mut options = Map::new();
    let Some(config) = config else { return (options, None) };

    if let Some(v) = config.temperature {
        options.insert("temperature".into(), v.into());
    }
    if let Some(v) = config.top_p {
        options.insert("top_p".into(), v.into());
    }
    if let Some(v) = config.top_k {
        options.insert("top_k".into(), v.into());
    }
    if let Some(v) = config.max_output_tokens {
        options.insert("num_predict".into(), v.into());
    }
    (options, config.response_schema.clone())
}

/// Convert one wire response into an [`LlmResponse`].
///
/// `call_offset` numbers tool calls across a streamed turn so their IDs stay
/// unique (`call_0`, `call_1`, ...).
pub(crate) fn to_llm_response(
    response: ChatResponse,
    partial: bool,
    call_offset: &mut usize,
) -> LlmResponse {
    let content = response.message.map(|message| {
        let mut content = Content::new(if message.role.is_empty() {
            "assistant".to_string()
        } else {
            message.role
        });
        if !message.content.is_empty() {
            content.parts.push(Part::Text { text: message.content });
        }
        for call in message.tool_calls {
            content.parts.push(Part::FunctionCall {
                name: call.function.name,
                args: call.function.arguments,
                id: Some(format!("call_{call_offset}")),
            });
            *call_offset += 1;
        }
        content
    });

    LlmResponse {
        content: content.filter(|c| !c.parts.is_empty()),
        partial: partial && !response.done,
        turn_complete: response.done,
        finish_reason: response.done_reason,
    }
}

/// Accumulates raw bytes and hands out complete newline-terminated lines.
///
/// A line may arrive split across several network chunks, including in the
/// middle of a multi-byte character; decoding happens only once a line is
/// complete.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append `bytes` and return every line completed by them, without the
    /// trailing newline. Blank lines are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// Return whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}
