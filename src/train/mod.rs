//! Supervised fine-tuning
//!
//! Model assets come from the Hub by repo id; the decoder is built with
//! candle-nn and trained with AdamW over next-token cross-entropy.

pub mod batcher;
pub mod model;
pub mod trainer;

pub use batcher::{Batch, Batcher};
pub use model::{CausalLm, ModelConfig};
pub use trainer::{Trainer, TrainerConfig, TrainReport};

use crate::errors::Result;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::PathBuf;

/// Files resolved from a Hub model repo
#[derive(Debug, Clone)]
pub struct ModelAssets {
    pub tokenizer: PathBuf,
    pub config: Option<PathBuf>,
    pub weights: Option<PathBuf>,
}

/// Download tokenizer, and when present, model config and checkpoint.
///
/// Only the tokenizer is mandatory; a repo without a compatible
/// checkpoint trains from initialization.
pub fn fetch_assets(model_id: &str) -> Result<ModelAssets> {
    let api = Api::new()?;
    let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

    let tokenizer = repo.get("tokenizer.json")?;
    let config = repo.get("config.json").ok();
    let weights = repo.get("model.safetensors").ok();

    Ok(ModelAssets {
        tokenizer,
        config,
        weights,
    })
}
