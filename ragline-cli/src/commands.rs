use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use ragline_agent::{
    AgentConfig, Conversation, RetrievalQa, SubQuestionDecomposer, ToolCallingAgent,
};
use ragline_core::Llm;
use ragline_model::{OllamaClient, OllamaConfig};
use ragline_rag::{
    ChromaVectorStore, InMemoryVectorStore, OllamaEmbeddingProvider, RagConfig, RagPipeline,
    VectorStore, load_path,
};
use ragline_tool::{ToolOutcome, ToolRegistry, multiply_tool, weather_tool};
use tracing::{info, warn};

use crate::cli::{ChunkArgs, Cli, Command, GlobalArgs, StoreKind};
use crate::console::run_console;

pub fn agent_config(global: &GlobalArgs) -> AgentConfig {
    let mut config = AgentConfig::default().with_model(&global.model);
    config.temperature = Some(global.temperature);
    config.max_output_tokens = global.max_tokens;
    config
}

pub fn build_llm(global: &GlobalArgs) -> Result<Arc<dyn Llm>> {
    let config = OllamaConfig::new(&global.model).with_base_url(&global.ollama_url);
    Ok(Arc::new(OllamaClient::new(config)?))
}

pub fn rag_config(
    chunking: &ChunkArgs,
    top_k: usize,
    min_score: Option<f32>,
) -> Result<RagConfig> {
    let mut builder = RagConfig::builder()
        .chunk_size(chunking.chunk_size)
        .chunk_overlap(chunking.chunk_overlap)
        .top_k(top_k);
    if let Some(threshold) = min_score {
        builder = builder.similarity_threshold(threshold);
    }
    Ok(builder.build()?)
}

pub fn build_pipeline(global: &GlobalArgs, config: RagConfig) -> Result<RagPipeline> {
    let embedder = OllamaEmbeddingProvider::new(&global.ollama_url)?
        .with_model(&global.embed_model, global.embed_dimensions);
    let store: Arc<dyn VectorStore> = match global.store {
        StoreKind::Memory => Arc::new(InMemoryVectorStore::new()),
        StoreKind::Chroma => Arc::new(ChromaVectorStore::new(&global.chroma_url)?),
    };
    Ok(RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .vector_store(store)
        .build()?)
}

/// Load `path` and replace `collection` with its chunks. Returns the chunk count.
pub async fn ingest_file(pipeline: &RagPipeline, collection: &str, path: &Path) -> Result<usize> {
    let documents =
        load_path(path).await.with_context(|| format!("failed to load {}", path.display()))?;
    let chunks = pipeline.ingest_documents(collection, &documents).await?;
    info!(collection, path = %path.display(), chunks = chunks.len(), "ingestion complete");
    Ok(chunks.len())
}

fn demo_tools() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(weather_tool()))
        .with_tool(Arc::new(multiply_tool()))
}

pub async fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Ingest { path, chunking } => {
            let pipeline = build_pipeline(&global, rag_config(&chunking, 4, None)?)?;
            let count = ingest_file(&pipeline, &global.collection, &path).await?;
            println!("Ingested {count} chunks into '{}'", global.collection);
            if global.store == StoreKind::Memory {
                warn!("the in-memory store is discarded when this process exits");
            }
        }
        Command::Ask { question, file, top_k, min_score, stream, chunking } => {
            let pipeline = build_pipeline(&global, rag_config(&chunking, top_k, min_score)?)?;
            match &file {
                Some(path) => {
                    ingest_file(&pipeline, &global.collection, path).await?;
                }
                None if global.store == StoreKind::Memory => {
                    warn!("in-memory store without --file: the answer will have no context");
                }
                None => {}
            }

            let qa = RetrievalQa::new(Arc::new(pipeline), build_llm(&global)?)
                .with_config(agent_config(&global))?;
            if stream {
                let mut fragments = qa.answer_stream(&global.collection, &question).await?;
                let mut stdout = std::io::stdout();
                while let Some(item) = fragments.next().await {
                    print!("{}", item?.text());
                    stdout.flush()?;
                }
                println!();
            } else {
                println!("{}", qa.answer(&global.collection, &question).await?);
            }
        }
        Command::Chat { system } => {
            let mut conversation =
                Conversation::new(build_llm(&global)?).with_config(agent_config(&global))?;
            if let Some(system) = system {
                conversation = conversation.with_system(system);
            }
            run_console(conversation).await?;
        }
        Command::Decompose { question, max_sub_questions } => {
            let config = agent_config(&global).with_max_sub_questions(max_sub_questions);
            let decomposer =
                SubQuestionDecomposer::new(build_llm(&global)?)?.with_config(config)?;
            let result = decomposer.run(&question).await?;
            for pair in &result.sub_answers {
                println!("Question: {}\nAnswer: {}", pair.question, pair.answer);
                println!("------------------");
            }
            println!("{}", result.answer);
        }
        Command::Tools { question, max_tool_rounds, transcript } => {
            let config = agent_config(&global).with_max_tool_rounds(max_tool_rounds);
            let agent =
                ToolCallingAgent::new(build_llm(&global)?, demo_tools())?.with_config(config)?;
            let run = agent.run(&question).await?;
            for outcome in &run.outcomes {
                if let ToolOutcome::Skipped { request, .. } = outcome {
                    eprintln!("Skipped unknown tool: {}", request.name);
                }
            }
            if transcript {
                println!("{}", serde_json::to_string_pretty(&run.transcript)?);
            }
            println!("{}", run.answer);
        }
    }
    Ok(())
}
