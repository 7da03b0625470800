//! Remote embedding client
//!
//! Talks to an OpenAI-style `/v1/embeddings` endpoint. The bearer token
//! comes from the environment or the config file, never from source.
//! The [`Embedder`] trait is the seam for deterministic test embedders.

use crate::errors::{LuminaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inputs per embedding request
const REQUEST_BATCH: usize = 64;

/// Anything that can turn text into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(LuminaError::EmbeddingMismatch {
            sent: 1,
            received: 0,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for the embedding API
pub struct RemoteEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl RemoteEmbedder {
    /// Create a client; fails fast when no credential is available
    pub fn new(base_url: String, model: String, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(LuminaError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    async fn request_batch(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or_else(|| "no error body".to_string());
            return Err(LuminaError::EmbeddingApi {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != input.len() {
            return Err(LuminaError::EmbeddingMismatch {
                sent: input.len(),
                received: parsed.data.len(),
            });
        }

        // The API reports an index per item; restore input order.
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(REQUEST_BATCH) {
            vectors.extend(self.request_batch(batch).await?);
        }
        Ok(vectors)
    }
}
