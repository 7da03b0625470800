use crate::errors::{LuminaError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable consulted before the config file for the
/// embedding API credential. The key is never stored in source.
pub const API_KEY_ENV: &str = "LUMINA_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub finetune: FinetuneConfig,
}

/// Remote embedding API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Fallback credential; LUMINA_API_KEY takes precedence
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
        }
    }
}

/// Retrieval index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub urls: Vec<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://lilianweng.github.io/posts/2023-06-23-agent/".to_string(),
                "https://lilianweng.github.io/posts/2023-03-15-prompt-engineering/".to_string(),
                "https://lilianweng.github.io/posts/2023-10-25-adv-attack-llm/".to_string(),
            ],
            chunk_size: 250,
            chunk_overlap: 0,
            top_k: 4,
        }
    }
}

/// Fine-tuning run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneConfig {
    /// Hub model repo providing tokenizer.json and config.json
    pub model_id: String,
    /// Hub dataset repo or local JSONL path
    pub dataset: String,
    pub min_avg_rating: f64,
    pub min_responses: u32,
    pub max_rows: usize,
    pub eval_fraction: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub eval_steps: usize,
    pub learning_rate: f64,
    pub block_size: usize,
    pub output_dir: PathBuf,
    pub logging_dir: PathBuf,
}

impl Default for FinetuneConfig {
    fn default() -> Self {
        Self {
            model_id: "openlm-research/open_llama_3b".to_string(),
            dataset: "openbmb/UltraFeedback".to_string(),
            min_avg_rating: 4.0,
            min_responses: 2,
            max_rows: 500,
            eval_fraction: 0.1,
            batch_size: 2,
            epochs: 3,
            eval_steps: 50,
            learning_rate: 5e-5,
            block_size: 256,
            output_dir: PathBuf::from("./results"),
            logging_dir: PathBuf::from("./logs"),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| LuminaError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| LuminaError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LuminaError::ConfigError("Could not determine home directory".to_string()))?;

        Ok(home.join(".lumina").join("config.toml"))
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_size == 0 {
            return Err(LuminaError::ConfigError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.chunk_overlap >= self.pipeline.chunk_size {
            return Err(LuminaError::ConfigError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.pipeline.chunk_overlap, self.pipeline.chunk_size
            )));
        }
        if self.pipeline.top_k == 0 {
            return Err(LuminaError::ConfigError(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.finetune.batch_size == 0 {
            return Err(LuminaError::ConfigError(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.finetune.eval_fraction <= 0.0 || self.finetune.eval_fraction >= 1.0 {
            return Err(LuminaError::ConfigError(format!(
                "eval_fraction must be in (0, 1), got {}",
                self.finetune.eval_fraction
            )));
        }
        Ok(())
    }

    /// Resolve the embedding API key: environment first, config second
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                return Ok(key);
            }
        }

        self.embedding
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LuminaError::MissingApiKey)
    }
}
