//! Lumina - ML workbench CLI
//!
//! Three independent operations sharing one ambient stack:
//!
//! - **probe**: accelerator and environment diagnostics
//! - **index**: web pages -> chunks -> embeddings -> in-process retriever
//! - **finetune**: ranked prompt dataset -> filtered rows -> training loop

pub mod errors;
pub mod cli;
pub mod config;

// Environment probe
pub mod probe;

// Retrieval index pipeline
pub mod ingest;
pub mod chunk;
pub mod embed;
pub mod store;
pub mod pipeline;

// Fine-tuning
pub mod dataset;
pub mod train;

// Re-export commonly used types
pub use errors::{LuminaError, Result};
