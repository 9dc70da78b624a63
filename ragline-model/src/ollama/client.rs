//! Ollama chat client implementation.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use ragline_core::{CoreError, Llm, LlmRequest, LlmResponseStream, Result};
use tracing::{debug, error};

use super::config::OllamaConfig;
use super::convert::{self, ChatRequest, ChatResponse, LineBuffer};

/// Client for a local Ollama server's `/api/chat` endpoint.
///
/// Blocking requests yield a single complete response. Streaming requests
/// yield one partial response per NDJSON line, in arrival order, ending with
/// the `done` line. A body that ends without a `done` line is an error.
/// Failures are surfaced unchanged; nothing is retried.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a client, validating `config` before any request is made.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client: reqwest::Client::new(), config })
    }

    /// Create a client from `OLLAMA_BASE_URL` / `OLLAMA_MODEL`.
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn build_request(&self, request: &LlmRequest, stream: bool) -> ChatRequest {
        let model = match request.model.as_str() {
            "" => self.config.model.clone(),
            name => name.to_string(),
        };
        let (options, format) = convert::convert_config(request.config.as_ref());

        ChatRequest {
            model,
            messages: request.contents.iter().flat_map(convert::content_to_messages).collect(),
            stream,
            tools: convert::convert_tools(&request.tools),
            format,
            options,
            keep_alive: self.config.keep_alive.clone(),
        }
    }
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    body: &ChatRequest,
) -> Result<reqwest::Response> {
    let response = client.post(url).json(body).send().await.map_err(|e| {
        error!(error = %e, "Ollama request failed");
        CoreError::Model(format!("Ollama request failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        error!(%status, "Ollama API error");
        return Err(CoreError::Model(format!("Ollama API returned {status}: {text}")));
    }
    Ok(response)
}

fn parse_line(line: &str) -> Result<ChatResponse> {
    let response: ChatResponse = serde_json::from_str(line)
        .map_err(|e| CoreError::Model(format!("invalid Ollama response line: {e}")))?;
    if let Some(message) = &response.error {
        return Err(CoreError::Model(format!("Ollama error: {message}")));
    }
    Ok(response)
}

#[async_trait]
impl Llm for OllamaClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream> {
        let body = self.build_request(&request, stream);
        let url = self.config.chat_url();
        let client = self.client.clone();

        debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            stream,
            "sending chat request"
        );

        let streaming = stream;
        let stream = try_stream! {
            let response = send(&client, &url, &body).await?;

            let mut calls = 0;
            if streaming {
                let mut buffer = LineBuffer::default();
                let mut bytes = Box::pin(response.bytes_stream());
                let mut done = false;
                while let Some(chunk) = bytes.next().await {
                    let chunk = chunk
                        .map_err(|e| CoreError::Model(format!("Ollama stream error: {e}")))?;
                    for line in buffer.push(&chunk) {
                        let reply = convert::to_llm_response(parse_line(&line)?, true, &mut calls);
                        done |= reply.turn_complete;
                        yield reply;
                    }
                }
                if let Some(line) = buffer.finish() {
                    let reply = convert::to_llm_response(parse_line(&line)?, true, &mut calls);
                    done |= reply.turn_complete;
                    yield reply;
                }
                if !done {
                    error!("Ollama stream ended without a done line");
                    Err::<(), _>(CoreError::Model("Ollama stream ended before done".into()))?;
                }
            } else {
                let text = response
                    .text()
                    .await
                    .map_err(|e| CoreError::Model(format!("failed to read Ollama response: {e}")))?;
                let parsed = parse_line(text.trim())?;
                if !parsed.done {
                    error!("Ollama response is not marked done");
                    Err::<(), _>(CoreError::Model("Ollama response ended before done".into()))?;
                }
                yield convert::to_llm_response(parsed, false, &mut calls);
            }
        };

        Ok(Box::pin(stream))
    }
}
