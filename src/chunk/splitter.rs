//! Token-budgeted document splitter
//!
//! Cuts only at whitespace word boundaries. A chunk's size is the sum of
//! the per-word token estimates, capped at `chunk_size`; `overlap` tokens
//! worth of trailing words are carried into the next chunk. Splitting is
//! deterministic for a fixed input and configuration.

use crate::chunk::counter::TokenCounter;
use crate::errors::{LuminaError, Result};
use crate::ingest::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Splitter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum estimated tokens per chunk
    pub chunk_size: usize,
    /// Estimated tokens carried over between consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 250,
            overlap: 0,
        }
    }
}

/// One embedded unit of text with its source metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub source_url: String,
    pub seq: usize,
    pub text: String,
    pub token_estimate: usize,
}

/// Token-budgeted splitter
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    counter: TokenCounter,
}

impl Chunker {
    /// Create a splitter, rejecting overlap >= chunk_size
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(LuminaError::ConfigError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.overlap >= config.chunk_size {
            return Err(LuminaError::ConfigError(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }
        Ok(Self {
            config,
            counter: TokenCounter::new(),
        })
    }

    /// Split one document into chunks; an empty document yields none
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let words: Vec<&str> = document.text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;

        for word in words {
            let word_tokens = self.counter.estimate(word);

            // A single word over budget still becomes its own chunk.
            if !current.is_empty() && current_tokens + word_tokens > self.config.chunk_size {
                self.push_chunk(&mut chunks, &current, current_tokens, document);
                let mut carried = self.carry_overlap(&current);
                let mut carried_tokens = self.counter.estimate_batch(&carried);
                // The carried tail plus the incoming word must still fit
                // the budget; shed the oldest carried words until it does.
                while !carried.is_empty()
                    && carried_tokens + word_tokens > self.config.chunk_size
                {
                    carried_tokens -= self.counter.estimate(carried.remove(0));
                }
                current = carried;
                current_tokens = carried_tokens;
            }

            current.push(word);
            current_tokens += word_tokens;
        }

        if !current.is_empty() {
            self.push_chunk(&mut chunks, &current, current_tokens, document);
        }

        chunks
    }

    /// Split a flat sequence of documents, numbering chunks per document
    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }

    fn push_chunk(
        &self,
        chunks: &mut Vec<Chunk>,
        words: &[&str],
        token_estimate: usize,
        document: &Document,
    ) {
        chunks.push(Chunk {
            id: Uuid::new_v4(),
            source_url: document.url.clone(),
            seq: chunks.len(),
            text: words.join(" "),
            token_estimate,
        });
    }

    /// Trailing words worth at most `overlap` estimated tokens
    fn carry_overlap<'a>(&self, words: &[&'a str]) -> Vec<&'a str> {
        if self.config.overlap == 0 {
            return Vec::new();
        }

        let mut carried = Vec::new();
        let mut tokens = 0usize;
        for word in words.iter().rev() {
            let word_tokens = self.counter.estimate(word);
            if tokens + word_tokens > self.config.overlap {
                break;
            }
            tokens += word_tokens;
            carried.push(*word);
        }
        carried.reverse();
        carried
    }
}
