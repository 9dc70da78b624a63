//! Error types for the `ragline-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The named collection does not exist in the vector store.
    ///
    /// Kept distinct from [`RagError::VectorStoreError`] because an absent
    /// collection is the normal state before the first ingestion.
    #[error("Collection '{collection}' not found ({backend})")]
    CollectionNotFound {
        /// The vector store backend that reported the miss.
        backend: String,
        /// The collection that was looked up.
        collection: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A source document could not be read or decoded.
    #[error("Loader error ({source_id}): {message}")]
    LoaderError {
        /// Path or identifier of the source.
        source_id: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// An error propagated from `ragline-core`.
    #[error(transparent)]
    Core(#[from] ragline_core::CoreError),
}

impl RagError {
    /// Whether this error reports a missing collection.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RagError::CollectionNotFound { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
