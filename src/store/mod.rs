//! In-process vector index
//!
//! Holds chunk embeddings in memory and answers cosine-similarity
//! queries. Built once per run; there is no persistence or invalidation.

use crate::chunk::Chunk;
use crate::errors::{LuminaError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Search parameters for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results to return
    pub top_k: usize,
    /// Drop hits scoring below this similarity, if set
    pub min_score: Option<f32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: None,
        }
    }
}

/// One retrieval result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub score: f32,
    pub text: String,
    pub source_url: String,
    pub seq: usize,
}

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Vec-backed vector index over embedded chunks
#[derive(Default)]
pub struct VectorStore {
    entries: Vec<Entry>,
}

impl VectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one chunk with its embedding
    ///
    /// All embeddings must share the dimension of the first insert.
    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(LuminaError::ModelError(
                "refusing to index an empty embedding".to_string(),
            ));
        }
        if let Some(expected) = self.dimension() {
            if embedding.len() != expected {
                return Err(LuminaError::ModelError(format!(
                    "embedding dimension {} does not match index dimension {}",
                    embedding.len(),
                    expected
                )));
            }
        }

        self.entries.push(Entry { chunk, embedding });
        Ok(())
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension of the stored vectors, if any
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    /// Top-k cosine search, scores descending
    pub fn search(&self, query: &[f32], params: &SearchParams) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                id: entry.chunk.id,
                score: cosine_similarity(query, &entry.embedding),
                text: entry.chunk.text.clone(),
                source_url: entry.chunk.source_url.clone(),
                seq: entry.chunk.seq,
            })
            .filter(|hit| params.min_score.map_or(true, |min| hit.score >= min))
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(params.top_k);
        hits
    }
}

/// Retriever configured with fixed search parameters
pub struct Retriever {
    store: Arc<VectorStore>,
    params: SearchParams,
}

impl Retriever {
    /// Wrap a finished index
    pub fn new(store: Arc<VectorStore>, params: SearchParams) -> Self {
        Self { store, params }
    }

    /// Query with the configured parameters; returns at most top_k hits
    pub fn retrieve(&self, query_embedding: &[f32]) -> Vec<SearchHit> {
        self.store.search(query_embedding, &self.params)
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

/// Cosine similarity; zero-magnitude inputs score 0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
