//! Error types for the Lumina workbench
//!
//! Provides typed errors with context propagation for the probe,
//! indexing, and fine-tuning commands.

use thiserror::Error;

/// Main error type for Lumina operations
#[derive(Error, Debug)]
pub enum LuminaError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Document fetch errors
    #[error("Failed to fetch {url}: {reason}")]
    FetchError { url: String, reason: String },

    /// Embedding API errors
    #[error("Embedding API error ({status}): {message}")]
    EmbeddingApi { status: u16, message: String },

    /// Embedding count does not match input count
    #[error("Embedding response mismatch: sent {sent} inputs, got {received} vectors")]
    EmbeddingMismatch { sent: usize, received: usize },

    /// Missing API credential
    #[error("No embedding API key: set LUMINA_API_KEY or [embedding].api_key in config")]
    MissingApiKey,

    /// Tokenizer errors
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    /// Dataset loading and filtering errors
    #[error("Dataset error: {0}")]
    DatasetError(String),

    /// Model construction and checkpoint errors
    #[error("Model error: {0}")]
    ModelError(String),

    /// Hugging Face Hub download errors
    #[error("Hub download failed: {0}")]
    HubError(String),

    /// Tensor operation errors
    #[error("Tensor error: {0}")]
    TensorError(#[from] candle_core::Error),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Lumina operations
pub type Result<T> = std::result::Result<T, LuminaError>;

impl From<hf_hub::api::sync::ApiError> for LuminaError {
    fn from(err: hf_hub::api::sync::ApiError) -> Self {
        LuminaError::HubError(err.to_string())
    }
}
