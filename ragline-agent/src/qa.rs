use std::sync::Arc;

use ragline_core::{Content, Llm, LlmResponseStream, generate_text};
use ragline_rag::{Composer, RagPipeline, SearchResult};
use tracing::{debug, info, instrument};

use crate::config::AgentConfig;
use crate::error::Result;

/// Question answering over an ingested collection.
///
/// Each call retrieves the top matches for the question, composes them into a
/// prompt and sends that prompt to the model as a single user message.
pub struct RetrievalQa {
    pipeline: Arc<RagPipeline>,
    llm: Arc<dyn Llm>,
    composer: Composer,
    config: AgentConfig,
}

impl RetrievalQa {
    pub fn new(pipeline: Arc<RagPipeline>, llm: Arc<dyn Llm>) -> Self {
        Self { pipeline, llm, composer: Composer::default(), config: AgentConfig::default() }
    }

    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Retrieve context for `question` and render the final prompt.
    pub async fn prompt(
        &self,
        collection: &str,
        question: &str,
    ) -> Result<(String, Vec<SearchResult>)> {
        let results = self.pipeline.query(collection, question).await?;
        debug!(collection, results = results.len(), "retrieved context");
        let prompt = self.composer.compose_results(&results, question)?;
        Ok((prompt, results))
    }

    /// Answer in blocking mode.
    #[instrument(name = "qa.answer", skip(self, question), fields(model = %self.llm.name()))]
    pub async fn answer(&self, collection: &str, question: &str) -> Result<String> {
        let (prompt, _) = self.prompt(collection, question).await?;
        let answer = generate_text(self.llm.as_ref(), self.request(prompt)).await?;
        info!(chars = answer.len(), "answer generated");
        Ok(answer)
    }

    /// Answer in streaming mode; concatenating the fragments in arrival order
    /// gives the full answer.
    pub async fn answer_stream(
        &self,
        collection: &str,
        question: &str,
    ) -> Result<LlmResponseStream> {
        let (prompt, _) = self.prompt(collection, question).await?;
        Ok(self.llm.generate_content(self.request(prompt), true).await?)
    }

    fn request(&self, prompt: String) -> ragline_core::LlmRequest {
        self.config.request(vec![Content::user(prompt)])
    }
}
