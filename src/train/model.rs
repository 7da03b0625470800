//! Causal decoder model
//!
//! A compact GPT-style decoder: token and position embeddings, pre-norm
//! blocks with causal multi-head attention and a GELU MLP, final norm,
//! and an LM head. Weights live in the caller's VarMap so checkpoints
//! can be loaded and saved around training.

use crate::errors::{LuminaError, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{
    embedding, layer_norm, linear, ops, Embedding, LayerNorm, Linear, Module, VarBuilder,
};
use serde::Deserialize;
use std::path::Path;

/// Decoder hyperparameters, loadable from a Hub config.json
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub vocab_size: usize,
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_num_layers", alias = "num_hidden_layers")]
    pub num_layers: usize,
    #[serde(default = "default_num_heads", alias = "num_attention_heads")]
    pub num_heads: usize,
    #[serde(default = "default_max_positions", alias = "max_position_embeddings")]
    pub max_positions: usize,
}

fn default_hidden_size() -> usize {
    256
}
fn default_num_layers() -> usize {
    4
}
fn default_num_heads() -> usize {
    4
}
fn default_max_positions() -> usize {
    512
}

impl ModelConfig {
    /// Small default configuration with the given vocabulary
    pub fn with_vocab(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            hidden_size: default_hidden_size(),
            num_layers: default_num_layers(),
            num_heads: default_num_heads(),
            max_positions: default_max_positions(),
        }
    }

    /// Parse a config.json; the vocabulary size must be present there
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ModelConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(LuminaError::ModelError(
                "vocab_size must be greater than zero".to_string(),
            ));
        }
        if self.num_heads == 0 || self.hidden_size % self.num_heads != 0 {
            return Err(LuminaError::ModelError(format!(
                "hidden_size ({}) must be divisible by num_heads ({})",
                self.hidden_size, self.num_heads
            )));
        }
        Ok(())
    }

    fn head_dim(&self) -> usize {
        self.hidden_size / self.num_heads
    }
}

struct Attention {
    q_proj: Linear,
    k_proj: Linear,
    v_proj: Linear,
    o_proj: Linear,
    num_heads: usize,
    head_dim: usize,
}

impl Attention {
    fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let h = config.hidden_size;
        Ok(Self {
            q_proj: linear(h, h, vb.pp("q_proj"))?,
            k_proj: linear(h, h, vb.pp("k_proj"))?,
            v_proj: linear(h, h, vb.pp("v_proj"))?,
            o_proj: linear(h, h, vb.pp("o_proj"))?,
            num_heads: config.num_heads,
            head_dim: config.head_dim(),
        })
    }

    fn forward(&self, hidden: &Tensor) -> Result<Tensor> {
        let (b, t, _) = hidden.dims3()?;

        let split = |proj: &Linear| -> Result<Tensor> {
            Ok(proj
                .forward(hidden)?
                .reshape((b, t, self.num_heads, self.head_dim))?
                .transpose(1, 2)?
                .contiguous()?)
        };

        let q = split(&self.q_proj)?;
        let k = split(&self.k_proj)?;
        let v = split(&self.v_proj)?;

        let scale = 1.0 / (self.head_dim as f64).sqrt();
        let scores = (q.matmul(&k.transpose(2, 3)?.contiguous()?)? * scale)?;

        let masked = apply_causal_mask(&scores)?;
        let weights = ops::softmax_last_dim(&masked)?;

        let context = weights
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((b, t, self.num_heads * self.head_dim))?;

        Ok(self.o_proj.forward(&context)?)
    }
}

/// Mask future positions with -inf before softmax
fn apply_causal_mask(scores: &Tensor) -> Result<Tensor> {
    let (b, h, t, _) = scores.dims4()?;
    let device = scores.device();

    let mask: Vec<u8> = (0..t)
        .flat_map(|i| (0..t).map(move |j| u8::from(j > i)))
        .collect();
    let mask = Tensor::from_slice(&mask, (t, t), device)?.broadcast_as((b, h, t, t))?;

    let neg_inf = Tensor::new(f32::NEG_INFINITY, device)?
        .to_dtype(scores.dtype())?
        .broadcast_as((b, h, t, t))?;

    Ok(mask.where_cond(&neg_inf, scores)?)
}

struct Mlp {
    up: Linear,
    down: Linear,
}

impl Mlp {
    fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let h = config.hidden_size;
        Ok(Self {
            up: linear(h, 4 * h, vb.pp("up"))?,
            down: linear(4 * h, h, vb.pp("down"))?,
        })
    }

    fn forward(&self, hidden: &Tensor) -> Result<Tensor> {
        Ok(self.down.forward(&self.up.forward(hidden)?.gelu()?)?)
    }
}

struct Block {
    ln1: LayerNorm,
    attention: Attention,
    ln2: LayerNorm,
    mlp: Mlp,
}

impl Block {
    fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            ln1: layer_norm(config.hidden_size, 1e-5, vb.pp("ln1"))?,
            attention: Attention::new(config, vb.pp("attn"))?,
            ln2: layer_norm(config.hidden_size, 1e-5, vb.pp("ln2"))?,
            mlp: Mlp::new(config, vb.pp("mlp"))?,
        })
    }

    fn forward(&self, hidden: &Tensor) -> Result<Tensor> {
        let attended = (hidden + self.attention.forward(&self.ln1.forward(hidden)?)?)?;
        Ok((&attended + self.mlp.forward(&self.ln2.forward(&attended)?)?)?)
    }
}

/// GPT-style causal language model
pub struct CausalLm {
    token_embedding: Embedding,
    position_embedding: Embedding,
    blocks: Vec<Block>,
    ln_f: LayerNorm,
    lm_head: Linear,
    config: ModelConfig,
    device: Device,
}

impl CausalLm {
    /// Build the model over a VarBuilder (typically VarMap-backed)
    pub fn new(config: ModelConfig, vb: VarBuilder, device: Device) -> Result<Self> {
        config.validate()?;

        let token_embedding = embedding(config.vocab_size, config.hidden_size, vb.pp("tok_emb"))?;
        let position_embedding =
            embedding(config.max_positions, config.hidden_size, vb.pp("pos_emb"))?;

        let mut blocks = Vec::with_capacity(config.num_layers);
        for layer in 0..config.num_layers {
            blocks.push(Block::new(&config, vb.pp(format!("block_{}", layer)))?);
        }

        let ln_f = layer_norm(config.hidden_size, 1e-5, vb.pp("ln_f"))?;
        let lm_head = linear(config.hidden_size, config.vocab_size, vb.pp("lm_head"))?;

        Ok(Self {
            token_embedding,
            position_embedding,
            blocks,
            ln_f,
            lm_head,
            config,
            device,
        })
    }

    /// Forward pass: (batch, seq) token ids to (batch, seq, vocab) logits
    pub fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let (_, t) = input_ids.dims2()?;
        if t > self.config.max_positions {
            return Err(LuminaError::ModelError(format!(
                "sequence length {} exceeds max_positions {}",
                t, self.config.max_positions
            )));
        }

        let positions = Tensor::arange(0u32, t as u32, &self.device)?;
        let pos = self.position_embedding.forward(&positions)?.unsqueeze(0)?;
        let mut hidden = self
            .token_embedding
            .forward(input_ids)?
            .broadcast_add(&pos)?;

        for block in &self.blocks {
            hidden = block.forward(&hidden)?;
        }

        let hidden = self.ln_f.forward(&hidden)?;
        Ok(self.lm_head.forward(&hidden)?)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Parameter dtype used for initialization and checkpoints
    pub fn dtype() -> DType {
        DType::F32
    }
}
