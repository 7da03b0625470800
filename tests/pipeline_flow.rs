//! End-to-end retrieval index flow over in-memory documents
//!
//! Uses a deterministic embedder so the whole fetch-free path runs
//! without network access: chunk -> embed -> index -> query.

use async_trait::async_trait;
use std::sync::Arc;

use lumina::chunk::ChunkerConfig;
use lumina::embed::Embedder;
use lumina::ingest::Document;
use lumina::pipeline::IndexPipeline;
use lumina::store::SearchParams;
use lumina::Result;

/// Embeds by letter histogram so related texts score close together
struct HistogramEmbedder;

#[async_trait]
impl Embedder for HistogramEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut counts = [0.0f32; 26];
                for c in text.chars().filter(|c| c.is_ascii_lowercase()) {
                    counts[(c as u8 - b'a') as usize] += 1.0;
                }
                counts.to_vec()
            })
            .collect())
    }
}

fn default_pipeline() -> IndexPipeline {
    IndexPipeline::new(
        ChunkerConfig::default(),
        SearchParams::default(),
        Arc::new(HistogramEmbedder),
        false,
    )
    .unwrap()
}

fn corpus() -> Vec<Document> {
    vec![
        Document {
            url: "https://example.com/agents".to_string(),
            text: vec!["agent planning memory tools"; 120].join(" "),
        },
        Document {
            url: "https://example.com/prompting".to_string(),
            text: vec!["prompt instruction zero shot"; 120].join(" "),
        },
        Document {
            url: "https://example.com/attacks".to_string(),
            text: vec!["adversarial attack jailbreak"; 120].join(" "),
        },
    ]
}

#[tokio::test]
async fn test_three_documents_index_with_default_settings() {
    let pipeline = default_pipeline();
    let (retriever, report) = pipeline.build_from_documents(corpus()).await.unwrap();

    assert_eq!(report.documents, 3);
    assert!(report.chunks > 3, "each page should split into chunks");
    assert_eq!(report.vectors, report.chunks);
    assert_eq!(report.dimension, 26);
    assert_eq!(retriever.params().top_k, 4);
}

#[tokio::test]
async fn test_query_returns_four_relevant_chunks() {
    let pipeline = default_pipeline();
    let (retriever, _) = pipeline.build_from_documents(corpus()).await.unwrap();

    let hits = pipeline
        .query(&retriever, "agent planning and memory")
        .await
        .unwrap();

    assert_eq!(hits.len(), 4);
    assert_eq!(
        hits[0].source_url, "https://example.com/agents",
        "best hit should come from the matching page"
    );
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_rebuild_is_deterministic() {
    let pipeline = default_pipeline();
    let (_, first) = pipeline.build_from_documents(corpus()).await.unwrap();
    let (_, second) = pipeline.build_from_documents(corpus()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_chunks_keep_their_source_urls() {
    let pipeline = default_pipeline();
    let (retriever, _) = pipeline.build_from_documents(corpus()).await.unwrap();

    let hits = pipeline
        .query(&retriever, "adversarial jailbreak")
        .await
        .unwrap();

    assert!(hits
        .iter()
        .all(|hit| hit.source_url.starts_with("https://example.com/")));
}
