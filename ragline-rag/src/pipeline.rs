//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest-and-query workflow by composing
//! an [`EmbeddingProvider`], a [`VectorStore`] and a [`Chunker`]. The same
//! embedding provider serves both ingestion and queries.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragline_rag::{RagPipeline, RagConfig, InMemoryVectorStore, RecursiveChunker};
//!
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .chunker(Arc::new(RecursiveChunker::from_config(&config)?))
//!     .config(config)
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.ingest_documents("docs", &documents).await?;
//! let results = pipeline.query("docs", "search query").await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The RAG pipeline orchestrator.
///
/// Ingestion (chunk → embed → replace collection) and query execution
/// (embed → search → filter). Construct one via [`RagPipeline::builder()`].
///
/// Ingesting into a collection replaces its previous contents wholesale.
/// Re-ingestion and queries against the same collection must not overlap.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create a named collection in the vector store.
    ///
    /// The collection is created with the dimensionality reported by the
    /// configured [`EmbeddingProvider`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the vector store operation fails.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
            RagError::PipelineError(format!("failed to create collection '{name}': {e}"))
        })
    }

    /// Delete a named collection from the vector store.
    ///
    /// Deleting a collection that does not exist is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the vector store operation fails.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        match self.vector_store.delete_collection(name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(collection = name, "collection absent, nothing to delete");
                Ok(())
            }
            Err(e) => {
                error!(collection = name, error = %e, "failed to delete collection");
                Err(RagError::PipelineError(format!("failed to delete collection '{name}': {e}")))
            }
        }
    }

    /// Embed `chunks` and replace the contents of `collection` with them.
    ///
    /// Every chunk is embedded before the collection is touched, so an
    /// embedding failure leaves the previous contents in place. The collection
    /// is then deleted (if present), recreated and filled.
    ///
    /// Returns the stored chunks with embeddings attached.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if two chunks share an id, or if
    /// embedding or storage fails.
    pub async fn ingest_chunks(
        &self,
        collection: &str,
        mut chunks: Vec<Chunk>,
    ) -> Result<Vec<Chunk>> {
        let mut ids = HashSet::with_capacity(chunks.len());
        if let Some(dup) = chunks.iter().find(|c| !ids.insert(c.id.as_str())) {
            error!(collection, chunk_id = %dup.id, "duplicate chunk id");
            return Err(RagError::PipelineError(format!(
                "duplicate chunk id '{}' in ingestion for '{collection}'",
                dup.id
            )));
        }

        if !chunks.is_empty() {
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(collection, error = %e, "embedding failed during ingestion");
                RagError::PipelineError(format!("embedding failed for '{collection}': {e}"))
            })?;
            if embeddings.len() != chunks.len() {
                return Err(RagError::PipelineError(format!(
                    "embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                )));
            }
            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
        }

        self.delete_collection(collection).await?;
        self.create_collection(collection).await?;

        self.vector_store.upsert(collection, &chunks).await.map_err(|e| {
            error!(collection, error = %e, "upsert failed during ingestion");
            RagError::PipelineError(format!("upsert failed for collection '{collection}': {e}"))
        })?;

        info!(
            collection,
            chunk_count = chunks.len(),
            model = self.embedding_provider.model_name(),
            "ingested chunks"
        );

        Ok(chunks)
    }

    /// Split `documents` with the configured chunker and ingest all resulting
    /// chunks as one replacement of `collection`.
    ///
    /// When several documents share an id, chunks of the second and later
    /// ones get `#n` appended to their ids (`notes_0#1`) so none are lost.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if embedding or storage fails.
    pub async fn ingest_documents(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<Vec<Chunk>> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut chunks = Vec::new();
        for document in documents {
            let count = seen.entry(document.id.as_str()).or_insert(0);
            let occurrence = *count;
            *count += 1;
            let mut split = self.chunker.chunk(document);
            if occurrence > 0 {
                debug!(document_id = %document.id, occurrence, "repeated document id");
                for chunk in &mut split {
                    chunk.id = format!("{}#{occurrence}", chunk.id);
                }
            }
            chunks.extend(split);
        }
        info!(
            collection,
            document_count = documents.len(),
            chunk_count = chunks.len(),
            "split documents"
        );
        self.ingest_chunks(collection, chunks).await
    }

    /// Query the pipeline using the configured `top_k`.
    ///
    /// See [`query_top_k`](RagPipeline::query_top_k).
    pub async fn query(&self, collection: &str, query: &str) -> Result<Vec<SearchResult>> {
        self.query_top_k(collection, query, self.config.top_k).await
    }

    /// Query the pipeline: embed → search → filter by threshold.
    ///
    /// Returns at most `top_k` results ordered by descending similarity score.
    /// Results below the configured `similarity_threshold`, if any, are dropped.
    /// A collection that was never ingested yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k == 0`, or
    /// [`RagError::PipelineError`] if embedding or search fails.
    pub async fn query_top_k(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::PipelineError(format!("query embedding failed: {e}"))
        })?;

        let results = match self.vector_store.search(collection, &query_embedding, top_k).await {
            Ok(results) => results,
            Err(e) if e.is_not_found() => {
                debug!(collection, "collection absent, returning no results");
                Vec::new()
            }
            Err(e) => {
                error!(collection, error = %e, "vector store search failed");
                return Err(RagError::PipelineError(format!(
                    "search failed in collection '{collection}': {e}"
                )));
            }
        };

        let filtered: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(collection, top_k, result_count = filtered.len(), "query completed");

        Ok(filtered)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `vector_store` are required. `config` defaults to
/// [`RagConfig::default()`] and `chunker` to a [`RecursiveChunker`] sized from
/// the config.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating the configuration and that all
    /// required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the config is invalid or a required
    /// field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::from_config(&config)?),
        };

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker })
    }
}
