use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "ragline", version)]
#[command(about = "Retrieval-augmented generation against a local model")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and logging settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Ollama server address
    #[arg(long, global = true, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Chat model
    #[arg(long, global = true, env = "OLLAMA_MODEL", default_value = "llama3.2")]
    pub model: String,

    /// Embedding model
    #[arg(long, global = true, env = "OLLAMA_EMBED_MODEL", default_value = "mxbai-embed-large")]
    pub embed_model: String,

    /// Length of the vectors the embedding model returns
    #[arg(long, global = true, env = "OLLAMA_EMBED_DIMENSIONS", default_value_t = 1024)]
    pub embed_dimensions: usize,

    /// Where chunk vectors are kept
    #[arg(
        long,
        global = true,
        value_enum,
        env = "RAGLINE_STORE",
        default_value_t = StoreKind::Chroma
    )]
    pub store: StoreKind,

    /// Chroma server address
    #[arg(long, global = true, env = "CHROMA_URL", default_value = "http://localhost:8000")]
    pub chroma_url: String,

    /// Collection to ingest into and query
    #[arg(long, global = true, env = "RAGLINE_COLLECTION", default_value = "ragline")]
    pub collection: String,

    /// Sampling temperature
    #[arg(long, global = true, default_value_t = 0.0)]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[arg(long, global = true)]
    pub max_tokens: Option<i32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "RAGLINE_LOG", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Process-local; contents are lost on exit
    Memory,
    Chroma,
}

/// Splitter settings.
#[derive(Debug, Clone, Args)]
pub struct ChunkArgs {
    #[arg(long, default_value_t = 512)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 100)]
    pub chunk_overlap: usize,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a text or PDF file, split it and replace the collection with it
    Ingest {
        path: PathBuf,

        #[command(flatten)]
        chunking: ChunkArgs,
    },

    /// Answer a question from the collection
    Ask {
        question: String,

        /// Ingest this file first
        #[arg(long)]
        file: Option<PathBuf>,

        /// Number of chunks placed in the prompt
        #[arg(long, default_value_t = 4)]
        top_k: usize,

        /// Drop chunks scoring below this similarity
        #[arg(long)]
        min_score: Option<f32>,

        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,

        #[command(flatten)]
        chunking: ChunkArgs,
    },

    /// Interactive chat; type "exit" to quit
    Chat {
        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,
    },

    /// Answer by splitting the question into sub-questions
    Decompose {
        question: String,

        #[arg(long, default_value_t = 5)]
        max_sub_questions: usize,
    },

    /// Answer with the get_weather and multiply tools available
    Tools {
        question: String,

        #[arg(long, default_value_t = 1)]
        max_tool_rounds: usize,

        /// Print the full message transcript
        #[arg(long)]
        transcript: bool,
    },
}
