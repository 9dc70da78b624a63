use ragline_core::CoreError;
use ragline_rag::RagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Retrieval failed.
    #[error(transparent)]
    Rag(#[from] RagError),

    /// The model, a tool or a prompt template failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
