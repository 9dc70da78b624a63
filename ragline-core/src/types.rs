//! Messages exchanged with a generation model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single role-tagged message made of one or more [`Part`]s.
///
/// Roles follow the chat convention used by local model servers:
/// `"system"`, `"user"`, `"assistant"` and `"tool"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// One piece of a [`Content`] message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text.
    Text { text: String },
    /// A tool call requested by the model.
    FunctionCall {
        name: String,
        args: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// The result of a tool call, sent back to the model.
    FunctionResponse {
        name: String,
        response: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl Content {
    /// Create an empty message with the given role.
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), parts: Vec::new() }
    }

    /// Append a text part.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    /// Append an arbitrary part.
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system").with_text(text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user").with_text(text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new("assistant").with_text(text)
    }

    /// Concatenate all text parts in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Iterate over the tool calls carried by this message.
    pub fn function_calls(&self) -> impl Iterator<Item = (&str, &Value, Option<&str>)> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionCall { name, args, id } => Some((name.as_str(), args, id.as_deref())),
            _ => None,
        })
    }

    pub fn has_function_calls(&self) -> bool {
        self.function_calls().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_concatenates_only_text_parts() {
        let content = Content::new("assistant")
            .with_text("Hello, ")
            .with_part(Part::FunctionCall { name: "x".into(), args: json!({}), id: None })
            .with_text("world");
        assert_eq!(content.text(), "Hello, world");
        assert!(content.has_function_calls());
    }

    #[test]
    fn part_serializes_with_type_tag() {
        let part = Part::Text { text: "hi".into() };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hi"}));
    }
}
