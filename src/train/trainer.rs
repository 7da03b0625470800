//! Fixed-configuration training loop
//!
//! AdamW over next-token cross-entropy, evaluation every `eval_steps`
//! steps, JSONL step logs under the logging directory, and a safetensors
//! checkpoint after each epoch.

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::dataset::TokenizedRow;
use crate::train::batcher::{Batch, Batcher};
use crate::train::model::{CausalLm, ModelConfig};

/// Training run settings
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub eval_steps: usize,
    pub learning_rate: f64,
    pub block_size: usize,
    pub seed: u64,
    pub output_dir: PathBuf,
    pub logging_dir: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 3,
            batch_size: 2,
            eval_steps: 50,
            learning_rate: 5e-5,
            block_size: 256,
            seed: 42,
            output_dir: PathBuf::from("./results"),
            logging_dir: PathBuf::from("./logs"),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: usize,
    pub steps: usize,
    pub final_train_loss: f64,
    pub final_eval_loss: Option<f64>,
}

#[derive(Serialize)]
struct StepLog<'a> {
    step: usize,
    epoch: usize,
    split: &'a str,
    loss: f64,
    timestamp: String,
}

/// Trainer owning the model and its variable map
pub struct Trainer {
    model: CausalLm,
    varmap: VarMap,
    device: Device,
    config: TrainerConfig,
}

impl Trainer {
    /// Build a fresh model ready for training
    pub fn new(model_config: ModelConfig, config: TrainerConfig, device: Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, CausalLm::dtype(), &device);
        let model = CausalLm::new(model_config, vb, device.clone())
            .context("Failed to build causal LM")?;

        Ok(Self {
            model,
            varmap,
            device,
            config,
        })
    }

    /// Load a safetensors checkpoint into the variable map
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<()> {
        self.varmap
            .load(path)
            .with_context(|| format!("Failed to load checkpoint {}", path.display()))
    }

    pub fn model(&self) -> &CausalLm {
        &self.model
    }

    /// Run the full training loop
    pub fn train(
        &mut self,
        train_rows: &[TokenizedRow],
        eval_rows: &[TokenizedRow],
    ) -> Result<TrainReport> {
        fs::create_dir_all(&self.config.output_dir)
            .context("Failed to create output directory")?;
        fs::create_dir_all(&self.config.logging_dir)
            .context("Failed to create logging directory")?;

        let log_path = self
            .config
            .logging_dir
            .join(format!("train-{}.jsonl", Utc::now().format("%Y%m%d-%H%M%S")));
        let mut log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .context("Failed to open step log")?;

        let batcher = Batcher::new(self.config.block_size, self.config.batch_size, 0);
        let mut blocks = batcher.blocks(train_rows);
        if blocks.is_empty() {
            anyhow::bail!("training set produced no blocks");
        }
        let eval_batches = batcher.batches(batcher.blocks(eval_rows));

        let mut optimizer = AdamW::new(
            self.varmap.all_vars(),
            ParamsAdamW {
                lr: self.config.learning_rate,
                ..Default::default()
            },
        )
        .context("Failed to build optimizer")?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut step = 0usize;
        let mut last_train_loss = f64::NAN;
        let mut last_eval_loss = None;

        for epoch in 1..=self.config.epochs {
            blocks.shuffle(&mut rng);

            let mut epoch_loss_sum = 0.0f64;
            let mut epoch_batches = 0usize;

            for batch in batcher.batches(blocks.clone()) {
                let loss = self.step_loss(&batch)?;
                optimizer
                    .backward_step(&loss)
                    .context("Optimizer step failed")?;

                let loss_val = loss.to_scalar::<f32>()? as f64;
                epoch_loss_sum += loss_val;
                epoch_batches += 1;
                step += 1;
                last_train_loss = loss_val;

                write_log(&mut log_file, step, epoch, "train", loss_val)?;

                if step % self.config.eval_steps == 0 && !eval_batches.is_empty() {
                    let eval_loss = self.evaluate(&eval_batches)?;
                    last_eval_loss = Some(eval_loss);
                    write_log(&mut log_file, step, epoch, "eval", eval_loss)?;
                }
            }

            let avg_train_loss = if epoch_batches > 0 {
                epoch_loss_sum / epoch_batches as f64
            } else {
                f64::NAN
            };

            if !eval_batches.is_empty() {
                let eval_loss = self.evaluate(&eval_batches)?;
                last_eval_loss = Some(eval_loss);
                println!(
                    "Epoch {:>2}/{} | train_loss={:.4} | eval_loss={:.4}",
                    epoch, self.config.epochs, avg_train_loss, eval_loss
                );
            } else {
                println!(
                    "Epoch {:>2}/{} | train_loss={:.4}",
                    epoch, self.config.epochs, avg_train_loss
                );
            }

            let checkpoint = self
                .config
                .output_dir
                .join(format!("checkpoint-epoch-{}.safetensors", epoch));
            self.varmap
                .save(&checkpoint)
                .with_context(|| format!("Failed to save {}", checkpoint.display()))?;
        }

        Ok(TrainReport {
            epochs: self.config.epochs,
            steps: step,
            final_train_loss: last_train_loss,
            final_eval_loss: last_eval_loss,
        })
    }

    /// Cross-entropy loss for one batch
    fn step_loss(&self, batch: &Batch) -> Result<Tensor> {
        let (inputs, targets) = self.tensors(batch)?;
        let logits = self.model.forward(&inputs)?;

        let (b, t, vocab) = logits.dims3()?;
        let logits = logits.reshape((b * t, vocab))?;
        let targets = targets.reshape(b * t)?;

        Ok(loss::cross_entropy(&logits, &targets)?)
    }

    /// Average forward-only loss over the eval batches
    fn evaluate(&self, eval_batches: &[Batch]) -> Result<f64> {
        let mut loss_sum = 0.0f64;
        for batch in eval_batches {
            let loss = self.step_loss(batch)?;
            loss_sum += loss.to_scalar::<f32>()? as f64;
        }
        Ok(loss_sum / eval_batches.len() as f64)
    }

    fn tensors(&self, batch: &Batch) -> Result<(Tensor, Tensor)> {
        let rows = batch.len();
        let cols = self.config.block_size;

        let flat_inputs: Vec<u32> = batch.inputs.iter().flatten().copied().collect();
        let flat_targets: Vec<u32> = batch.targets.iter().flatten().copied().collect();

        let inputs = Tensor::from_vec(flat_inputs, (rows, cols), &self.device)?;
        let targets = Tensor::from_vec(flat_targets, (rows, cols), &self.device)?;
        Ok((inputs, targets))
    }
}

fn write_log(file: &mut std::fs::File, step: usize, epoch: usize, split: &str, loss: f64) -> Result<()> {
    let record = StepLog {
        step,
        epoch,
        split,
        loss,
        timestamp: Utc::now().to_rfc3339(),
    };
    let line = serde_json::to_string(&record)?;
    writeln!(file, "{}", line).context("Failed to write step log")?;
    Ok(())
}
