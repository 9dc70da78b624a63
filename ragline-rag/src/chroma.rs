//! Chroma vector store backend.
//!
//! Provides [`ChromaVectorStore`] which implements [`VectorStore`] against a
//! Chroma server's v1 REST API using `reqwest`.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragline_rag::chroma::ChromaVectorStore;
//!
//! let store = ChromaVectorStore::new("http://localhost:8000")?;
//! store.create_collection("docs", 1024).await?;
//! store.upsert("docs", &chunks).await?;
//! let results = store.search("docs", &query_embedding, 5).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The default Chroma server address.
pub const DEFAULT_URL: &str = "http://localhost:8000";

const BACKEND: &str = "chroma";
const DOCUMENT_ID_KEY: &str = "document_id";

/// A [`VectorStore`] backed by [Chroma](https://www.trychroma.com/).
///
/// Collections are created with cosine distance (`hnsw:space = cosine`) and
/// search scores are reported as `1 - distance`, so they are comparable with
/// [`InMemoryVectorStore`](crate::InMemoryVectorStore) cosine scores. The
/// parent document ID is stored in the Chroma metadata alongside the chunk's
/// own metadata.
///
/// Chroma does not promise an order among equally distant entries.
#[derive(Debug, Clone)]
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: Url,
}

impl ChromaVectorStore {
    /// Create a store talking to the Chroma server at `url`.
    pub fn new(url: &str) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", url.trim_end_matches('/'))).map_err(|e| {
            RagError::ConfigError(format!("invalid Chroma URL '{url}': {e}"))
        })?;
        Ok(Self { client: reqwest::Client::new(), base_url })
    }

    /// Create a store from `CHROMA_URL`, defaulting to `http://localhost:8000`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("CHROMA_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(&url)
    }

    fn map_err(message: impl std::fmt::Display) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.to_string() }
    }

    fn not_found(collection: &str) -> RagError {
        RagError::CollectionNotFound {
            backend: BACKEND.to_string(),
            collection: collection.to_string(),
        }
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Self::map_err(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, mapping failure statuses to errors.
    ///
    /// `collection` names the collection the call concerns, so "does not
    /// exist" replies can be reported as [`RagError::CollectionNotFound`].
    async fn send(
        &self,
        method: Method,
        path: &[&str],
        body: Option<Value>,
        collection: &str,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.request(method, self.url(path)?);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(Self::map_err)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Chroma reports a missing collection as 404 on newer servers and as
            // a 4xx/5xx "does not exist" message on older ones.
            if status == StatusCode::NOT_FOUND || text.contains("does not exist") {
                return Err(Self::not_found(collection));
            }
            return Err(Self::map_err(format!("{status}: {text}")));
        }
        Ok(response)
    }

    /// Like [`send`](Self::send), decoding the JSON reply.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &[&str],
        body: Option<Value>,
        collection: &str,
    ) -> Result<T> {
        let response = self.send(method, path, body, collection).await?;
        response.json().await.map_err(|e| Self::map_err(format!("invalid response: {e}")))
    }

    async fn collection_id(&self, name: &str) -> Result<String> {
        let info: CollectionInfo =
            self.call(Method::GET, &["api", "v1", "collections", name], None, name).await?;
        Ok(info.id)
    }
}

// ── Chroma API types ───────────────────────────────────────────────

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<HashMap<&'a str, &'a str>>,
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

fn first<T>(nested: Option<Vec<Vec<T>>>) -> Vec<T> {
    nested.and_then(|rows| rows.into_iter().next()).unwrap_or_default()
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let body = json!({
            "name": name,
            "metadata": { "hnsw:space": "cosine", "dimensions": dimensions },
            "get_or_create": true,
        });
        let _: CollectionInfo =
            self.call(Method::POST, &["api", "v1", "collections"], Some(body), name).await?;
        debug!(collection = name, dimensions, "created chroma collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &["api", "v1", "collections", name], None, name).await?;
        debug!(collection = name, "deleted chroma collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let id = self.collection_id(collection).await?;
        if chunks.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            ids: chunks.iter().map(|c| c.id.as_str()).collect(),
            embeddings: chunks.iter().map(|c| c.embedding.as_slice()).collect(),
            documents: chunks.iter().map(|c| c.text.as_str()).collect(),
            metadatas: chunks
                .iter()
                .map(|c| {
                    let mut metadata: HashMap<&str, &str> =
                        c.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                    metadata.insert(DOCUMENT_ID_KEY, &c.document_id);
                    metadata
                })
                .collect(),
        };
        let body = serde_json::to_value(&request).map_err(Self::map_err)?;

        let path = ["api", "v1", "collections", id.as_str(), "upsert"];
        self.send(Method::POST, &path, Some(body), collection).await?;

        debug!(collection, count = chunks.len(), "upserted chunks to chroma");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let id = self.collection_id(collection).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let body = json!({ "ids": ids });
        let path = ["api", "v1", "collections", id.as_str(), "delete"];
        self.send(Method::POST, &path, Some(body), collection).await?;

        debug!(collection, count = ids.len(), "deleted entries from chroma");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let id = self.collection_id(collection).await?;

        // Older servers reject n_results larger than the collection.
        let path = ["api", "v1", "collections", id.as_str(), "count"];
        let count: usize = self.call(Method::GET, &path, None, collection).await?;
        let n_results = top_k.min(count);
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let body = json!({
            "query_embeddings": [embedding],
            "n_results": n_results,
            "include": ["documents", "metadatas", "distances"],
        });
        let path = ["api", "v1", "collections", id.as_str(), "query"];
        let response: QueryResponse =
            self.call(Method::POST, &path, Some(body), collection).await?;

        let ids = response.ids.into_iter().next().unwrap_or_default();
        let mut documents = first(response.documents).into_iter();
        let mut metadatas = first(response.metadatas).into_iter();
        let mut distances = first(response.distances).into_iter();

        let results = ids
            .into_iter()
            .map(|id| {
                let text = documents.next().flatten().unwrap_or_default();
                let mut metadata: HashMap<String, String> = metadatas
                    .next()
                    .flatten()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => (k, s),
                        other => (k, other.to_string()),
                    })
                    .collect();
                let document_id = metadata.remove(DOCUMENT_ID_KEY).unwrap_or_default();
                let score = 1.0 - distances.next().unwrap_or(1.0);

                SearchResult {
                    chunk: Chunk { id, text, embedding: vec![], metadata, document_id },
                    score,
                }
            })
            .collect();

        Ok(results)
    }
}
