//! Agentic retrieval tool.
//!
//! The [`RagTool`] wraps a [`RagPipeline`](crate::RagPipeline) as a
//! [`ragline_core::Tool`] so that a model can perform retrieval as a tool call.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragline_rag::{RagPipeline, RagTool};
//!
//! let pipeline = Arc::new(build_pipeline()?);
//! let tool = RagTool::new(pipeline, "my_docs");
//!
//! // The model calls the tool with:
//! // { "query": "How do I configure X?", "collection": "faq", "top_k": 5 }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use ragline_core::{CoreError, Tool};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::pipeline::RagPipeline;

/// A retrieval tool that wraps a [`RagPipeline`] for agentic use.
///
/// The tool accepts a required `query` string and optional `collection` and
/// `top_k` parameters, and returns the search results as JSON.
pub struct RagTool {
    pipeline: Arc<RagPipeline>,
    default_collection: String,
}

impl RagTool {
    /// Create a new `RagTool` backed by the given pipeline.
    ///
    /// The `default_collection` is used when the model does not specify
    /// a collection in the tool call arguments.
    pub fn new(pipeline: Arc<RagPipeline>, default_collection: impl Into<String>) -> Self {
        Self { pipeline, default_collection: default_collection.into() }
    }
}

#[async_trait]
impl Tool for RagTool {
    fn name(&self) -> &str {
        "rag_search"
    }

    fn description(&self) -> &str {
        "Search a knowledge base for relevant documents given a query"
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant documents"
                },
                "collection": {
                    "type": "string",
                    "description": "Collection to search. Uses the default collection if omitted."
                },
                "top_k": {
                    "type": "integer",
                    "description":
                        "Maximum number of results. Uses the pipeline default if omitted."
                }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, args: Value) -> ragline_core::Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::Tool("missing required 'query' parameter".into()))?;

        let collection =
            args.get("collection").and_then(|v| v.as_str()).unwrap_or(&self.default_collection);

        let top_k = args
            .get("top_k")
            .and_then(|v| v.as_u64())
            .map_or(self.pipeline.config().top_k, |v| v as usize);

        info!(query, collection, top_k, "rag_search tool called");

        let results = self.pipeline.query_top_k(collection, query, top_k).await.map_err(|e| {
            error!(error = %e, "rag_search failed");
            CoreError::Tool(format!("RAG search failed: {e}"))
        })?;

        Ok(serde_json::to_value(&results)?)
    }
}
