//! End-to-end retrieval index pipeline
//!
//! fetch -> flatten -> chunk -> embed -> index, then expose a top-k
//! retriever over the in-process store.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::chunk::{Chunker, ChunkerConfig};
use crate::embed::Embedder;
use crate::ingest::{Document, WebLoader};
use crate::store::{Retriever, SearchHit, SearchParams, VectorStore};

/// Chunk texts sent per embedding call
const EMBED_BATCH: usize = 64;

/// Summary of one index build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
    pub vectors: usize,
    pub dimension: usize,
}

/// Retrieval index pipeline
pub struct IndexPipeline {
    loader: WebLoader,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    search: SearchParams,
    show_progress: bool,
}

impl IndexPipeline {
    /// Create a pipeline over an embedder
    pub fn new(
        chunker_config: ChunkerConfig,
        search: SearchParams,
        embedder: Arc<dyn Embedder>,
        show_progress: bool,
    ) -> Result<Self> {
        let chunker = Chunker::new(chunker_config).context("Invalid chunker configuration")?;

        Ok(Self {
            loader: WebLoader::new(),
            chunker,
            embedder,
            search,
            show_progress,
        })
    }

    /// Fetch the given pages and build the index
    pub async fn build(&self, urls: &[String]) -> Result<(Retriever, IndexReport)> {
        let documents = self
            .loader
            .load_all(urls)
            .await
            .context("Failed to load source documents")?;

        self.build_from_documents(documents).await
    }

    /// Build the index from already-loaded documents
    pub async fn build_from_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<(Retriever, IndexReport)> {
        let chunks = self.chunker.split_all(&documents);

        let bar = if self.show_progress && !chunks.is_empty() {
            let pb = ProgressBar::new(chunks.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} embedding {pos}/{len} chunks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Some(pb)
        } else {
            None
        };

        let mut store = VectorStore::new();
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .context("Failed to embed chunk batch")?;

            for (chunk, embedding) in batch.iter().cloned().zip(vectors) {
                store.insert(chunk, embedding).context("Failed to index chunk")?;
            }
            if let Some(pb) = &bar {
                pb.inc(batch.len() as u64);
            }
        }
        if let Some(pb) = bar {
            pb.finish_and_clear();
        }

        let report = IndexReport {
            documents: documents.len(),
            chunks: chunks.len(),
            vectors: store.len(),
            dimension: store.dimension().unwrap_or(0),
        };

        let retriever = Retriever::new(Arc::new(store), self.search.clone());
        Ok((retriever, report))
    }

    /// Embed a query and search the index
    pub async fn query(&self, retriever: &Retriever, text: &str) -> Result<Vec<SearchHit>> {
        let embedding = self
            .embedder
            .embed_one(text)
            .await
            .context("Failed to embed query")?;

        Ok(retriever.retrieve(&embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::Embedder;
    use crate::errors::Result as LuminaResult;
    use async_trait::async_trait;

    /// Deterministic embedder: vector derives from character counts
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> LuminaResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let len = t.chars().count() as f32;
                    let vowels = t.chars().filter(|c| "aeiou".contains(*c)).count() as f32;
                    vec![len, vowels, 1.0]
                })
                .collect())
        }
    }

    fn pipeline(chunk_size: usize, top_k: usize) -> IndexPipeline {
        IndexPipeline::new(
            ChunkerConfig {
                chunk_size,
                overlap: 0,
            },
            SearchParams {
                top_k,
                min_score: None,
            },
            Arc::new(StubEmbedder),
            false,
        )
        .unwrap()
    }

    fn docs() -> Vec<Document> {
        vec![
            Document {
                url: "https://example.com/a".to_string(),
                text: vec!["alpha"; 30].join(" "),
            },
            Document {
                url: "https://example.com/b".to_string(),
                text: vec!["beta"; 30].join(" "),
            },
        ]
    }

    #[tokio::test]
    async fn test_build_reports_counts() {
        let (retriever, report) = pipeline(10, 4)
            .build_from_documents(docs())
            .await
            .unwrap();

        assert_eq!(report.documents, 2);
        assert!(report.chunks > 0);
        assert_eq!(report.vectors, report.chunks);
        assert_eq!(report.dimension, 3);
        assert_eq!(retriever.store().len(), report.vectors);
    }

    #[tokio::test]
    async fn test_chunk_count_deterministic_across_builds() {
        let p = pipeline(10, 4);
        let (_, first) = p.build_from_documents(docs()).await.unwrap();
        let (_, second) = p.build_from_documents(docs()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_query_returns_at_most_top_k() {
        let p = pipeline(10, 4);
        let (retriever, report) = p.build_from_documents(docs()).await.unwrap();
        assert!(report.chunks > 4);

        let hits = p.query(&retriever, "alpha alpha alpha").await.unwrap();
        assert_eq!(hits.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_documents_build_empty_index() {
        let p = pipeline(10, 4);
        let (retriever, report) = p.build_from_documents(Vec::new()).await.unwrap();

        assert_eq!(report.chunks, 0);
        assert_eq!(report.vectors, 0);
        assert!(retriever.store().is_empty());
    }
}
