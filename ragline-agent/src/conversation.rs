use std::sync::Arc;

use futures::StreamExt;
use ragline_core::{Content, Llm};
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::Result;

/// A chat session that keeps its message history in memory.
///
/// History lives only as long as the value; nothing is persisted.
pub struct Conversation {
    llm: Arc<dyn Llm>,
    config: AgentConfig,
    history: Vec<Content>,
}

impl Conversation {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, config: AgentConfig::default(), history: Vec::new() }
    }

    /// Start the history with a system message.
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.history.insert(0, Content::system(prompt));
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.retain(|c| c.role == "system");
    }

    /// Send one user message and stream the reply.
    ///
    /// `on_fragment` sees each piece of text as it arrives. On success the
    /// user message and the full reply are both in the history; on failure
    /// the history is left as it was before the call.
    pub async fn send<F>(&mut self, input: &str, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        self.history.push(Content::user(input));
        match self.stream_reply(&mut on_fragment).await {
            Ok(reply) => {
                debug!(turns = self.history.len(), chars = reply.len(), "reply received");
                self.history.push(Content::assistant(reply.as_str()));
                Ok(reply)
            }
            Err(err) => {
                self.history.pop();
                Err(err)
            }
        }
    }

    async fn stream_reply<F: FnMut(&str)>(&self, on_fragment: &mut F) -> Result<String> {
        let request = self.config.request(self.history.clone());
        let mut stream = self.llm.generate_content(request, true).await?;
        let mut reply = String::new();
        while let Some(item) = stream.next().await {
            let text = item?.text();
            if !text.is_empty() {
                on_fragment(&text);
                reply.push_str(&text);
            }
        }
        Ok(reply)
    }
}
