//! # ragline-rag
//!
//! Retrieval-augmented context assembly: load, split, embed, index, retrieve
//! and compose.
//!
//! ## Overview
//!
//! - [`Loader`] / [`load_path`] - read files into [`Document`]s
//! - [`Chunker`] - [`RecursiveChunker`] and [`FixedSizeChunker`]
//! - [`EmbeddingProvider`] - `OllamaEmbeddingProvider` (feature `ollama`)
//! - [`VectorStore`] - [`InMemoryVectorStore`] and `ChromaVectorStore` (feature `chroma`)
//! - [`RagPipeline`] - ingest and query a named collection
//! - [`Composer`] - turn retrieved chunks and a question into a prompt
//! - [`RagTool`] - retrieval exposed as a model-callable tool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragline_rag::{Composer, InMemoryVectorStore, RagPipeline, load_path};
//! use ragline_rag::ollama::OllamaEmbeddingProvider;
//!
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(Arc::new(OllamaEmbeddingProvider::from_env()?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let documents = load_path("notes.md").await?;
//! pipeline.ingest_documents("notes", &documents).await?;
//! let results = pipeline.query("notes", "what did I write about tokio?").await?;
//! let prompt = Composer::default().compose_results(&results, "what did I write about tokio?")?;
//! ```
//!
//! ## Features
//!
//! | Feature  | Enables |
//! |----------|---------|
//! | `ollama` | `OllamaEmbeddingProvider` (default) |
//! | `chroma` | `ChromaVectorStore` (default) |
//! | `pdf`    | `PdfLoader` |

pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod tool;
pub mod vectorstore;

#[cfg(feature = "chroma")]
pub mod chroma;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use composer::{Composer, DEFAULT_TEMPLATE};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::{InMemoryVectorStore, Similarity, cosine_similarity};
#[cfg(feature = "pdf")]
pub use loader::PdfLoader;
pub use loader::{Loader, TextFileLoader, load_path};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use tool::RagTool;
pub use vectorstore::VectorStore;

#[cfg(feature = "chroma")]
pub use chroma::ChromaVectorStore;
#[cfg(feature = "ollama")]
pub use ollama::OllamaEmbeddingProvider;
