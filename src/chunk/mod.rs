//! Token-budgeted text chunking
//!
//! Splits fetched documents into fixed-size chunks for embedding.

pub mod counter;
pub mod splitter;

pub use counter::TokenCounter;
pub use splitter::{Chunk, Chunker, ChunkerConfig};
