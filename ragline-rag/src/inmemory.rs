//! In-memory vector store using cosine or dot-product similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by insertion-ordered maps protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and single-process use; contents live as
//! long as the store does.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// The similarity measure a store ranks by.
///
/// Fixed per store, so ingest and query always agree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Similarity {
    /// Cosine of the angle between the vectors, in `[-1, 1]`.
    #[default]
    Cosine,
    /// Raw inner product.
    DotProduct,
}

impl Similarity {
    /// Score `a` against `b`.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Similarity::Cosine => cosine_similarity(a, b),
            Similarity::DotProduct => dot(a, b),
        }
    }
}

#[derive(Debug, Default)]
struct Collection {
    dimensions: usize,
    entries: IndexMap<String, Chunk>,
}

impl Collection {
    fn check_dimensions(&self, name: &str, len: usize, what: &str) -> Result<()> {
        if self.dimensions != 0 && len != self.dimensions {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!(
                    "{what} has {len} dimensions but collection '{name}' expects {}",
                    self.dimensions
                ),
            });
        }
        Ok(())
    }
}

/// An in-memory vector store.
///
/// Collections are stored as collection name → (chunk ID → chunk), where the
/// inner map remembers insertion order so equal scores rank in the order the
/// entries were added. All operations are async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use ragline_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    similarity: Similarity,
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store ranking by cosine similarity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store ranking by the given similarity measure.
    pub fn with_similarity(similarity: Similarity) -> Self {
        Self { similarity, collections: RwLock::default() }
    }

    /// Number of entries in `collection`, or `None` if it does not exist.
    pub async fn len(&self, collection: &str) -> Option<usize> {
        self.collections.read().await.get(collection).map(|c| c.entries.len())
    }

    fn not_found(collection: &str) -> RagError {
        RagError::CollectionNotFound {
            backend: BACKEND.to_string(),
            collection: collection.to_string(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dimensions, entries: IndexMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name).map(|_| ()).ok_or_else(|| Self::not_found(name))
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::not_found(collection))?;
        for chunk in chunks {
            let what = format!("chunk '{}'", chunk.id);
            store.check_dimensions(collection, chunk.embedding.len(), &what)?;
        }
        for chunk in chunks {
            store.entries.insert(chunk.id.clone(), chunk.clone());
        }
        debug!(collection, count = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::not_found(collection))?;
        for id in ids {
            // shift_remove keeps the remaining entries in insertion order
            store.entries.shift_remove(*id);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::not_found(collection))?;
        store.check_dimensions(collection, embedding.len(), "query embedding")?;

        let mut scored: Vec<SearchResult> = store
            .entries
            .values()
            .map(|chunk| {
                let score = self.similarity.score(&chunk.embedding, embedding);
                SearchResult { chunk: chunk.clone(), score }
            })
            .collect();

        // sort_by is stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        let mut chunk = Chunk::new(id, format!("text of {id}"), "doc");
        chunk.embedding = embedding;
        chunk
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [0.3, -0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn missing_collection_is_reported_as_not_found() {
        let store = InMemoryVectorStore::new();
        assert!(store.search("nope", &[1.0], 3).await.unwrap_err().is_not_found());
        assert!(store.delete_collection("nope").await.unwrap_err().is_not_found());
        assert!(store.upsert("nope", &[]).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        let chunks = vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("second", vec![2.0, 0.0]),
            chunk("third", vec![0.0, 1.0]),
            chunk("fourth", vec![3.0, 0.0]),
        ];
        store.upsert("c", &chunks).await.unwrap();

        let results = store.search("c", &[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "fourth", "third"]);
    }

    #[tokio::test]
    async fn dot_product_prefers_longer_vectors() {
        let store = InMemoryVectorStore::with_similarity(Similarity::DotProduct);
        store.create_collection("c", 2).await.unwrap();
        store
            .upsert("c", &[chunk("short", vec![1.0, 0.0]), chunk("long", vec![5.0, 0.0])])
            .await
            .unwrap();
        let results = store.search("c", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.id, "long");
        assert_eq!(results[0].score, 5.0);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 3).await.unwrap();
        let err = store.upsert("c", &[chunk("bad", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
        let err = store.search("c", &[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }

    #[tokio::test]
    async fn delete_removes_entries() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 1).await.unwrap();
        store.upsert("c", &[chunk("a", vec![1.0]), chunk("b", vec![1.0])]).await.unwrap();
        store.delete("c", &["a"]).await.unwrap();
        assert_eq!(store.len("c").await, Some(1));
    }
}
