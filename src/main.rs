//! Lumina - Main CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use lumina::cli::{Args, Commands};
use lumina::chunk::ChunkerConfig;
use lumina::config::Config;
use lumina::dataset::{self, DatasetFilter, DatasetSource};
use lumina::embed::RemoteEmbedder;
use lumina::pipeline::IndexPipeline;
use lumina::probe::{CandleRuntime, ProbeReport};
use lumina::store::SearchParams;
use lumina::train::{self, ModelConfig, Trainer, TrainerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };

    match &args.command {
        Commands::Probe => run_probe()?,
        Commands::Index {
            queries,
            urls,
            chunk_size,
            chunk_overlap,
            top_k,
        } => {
            let mut config = config;
            if !urls.is_empty() {
                config.pipeline.urls = urls.clone();
            }
            if let Some(size) = chunk_size {
                config.pipeline.chunk_size = *size;
            }
            if let Some(overlap) = chunk_overlap {
                config.pipeline.chunk_overlap = *overlap;
            }
            if let Some(k) = top_k {
                config.pipeline.top_k = *k;
            }
            config.validate()?;

            run_index(&args, &config, queries).await?;
        }
        Commands::Finetune {
            model,
            dataset,
            epochs,
            batch_size,
            eval_steps,
        } => {
            let mut config = config;
            if let Some(model) = model {
                config.finetune.model_id = model.clone();
            }
            if let Some(dataset) = dataset {
                config.finetune.dataset = dataset.clone();
            }
            if let Some(epochs) = epochs {
                config.finetune.epochs = *epochs;
            }
            if let Some(batch_size) = batch_size {
                config.finetune.batch_size = *batch_size;
            }
            if let Some(eval_steps) = eval_steps {
                config.finetune.eval_steps = *eval_steps;
            }
            config.validate()?;

            run_finetune(&args, &config)?;
        }
        Commands::Config => show_config(&config)?,
        Commands::Clean { logs } => clean(&config, *logs)?,
    }

    Ok(())
}

/// Report the numerical backend and any visible accelerator
fn run_probe() -> Result<()> {
    let report = ProbeReport::collect(&CandleRuntime)?;
    report.print();
    Ok(())
}

/// Build the retrieval index and answer any requested queries
async fn run_index(args: &Args, config: &Config, queries: &[String]) -> Result<()> {
    let api_key = config.resolve_api_key()?;
    let embedder = RemoteEmbedder::new(
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
        api_key,
    )?;

    let pipeline = IndexPipeline::new(
        ChunkerConfig {
            chunk_size: config.pipeline.chunk_size,
            overlap: config.pipeline.chunk_overlap,
        },
        SearchParams {
            top_k: config.pipeline.top_k,
            min_score: None,
        },
        Arc::new(embedder),
        args.verbosity().show_progress(),
    )?;

    println!("Indexing {} pages...", config.pipeline.urls.len());
    let (retriever, report) = pipeline.build(&config.pipeline.urls).await?;

    println!(
        "{} {} documents, {} chunks, {} vectors (dim {})",
        "Indexed".green(),
        report.documents,
        report.chunks,
        report.vectors,
        report.dimension
    );

    for query in queries {
        println!("\n{} {}", "Query:".cyan(), query);
        let hits = pipeline.query(&retriever, query).await?;
        if hits.is_empty() {
            println!("  (no results)");
        }
        for (rank, hit) in hits.iter().enumerate() {
            let preview: String = hit.text.chars().take(120).collect();
            println!(
                "  {}. [{:.3}] {} ({}#{})",
                rank + 1,
                hit.score,
                preview,
                hit.source_url,
                hit.seq
            );
        }
    }

    Ok(())
}

/// Load model assets and the dataset, then run the training loop
fn run_finetune(args: &Args, config: &Config) -> Result<()> {
    let ft = &config.finetune;

    println!("Resolving model assets for {}...", ft.model_id);
    let assets = train::fetch_assets(&ft.model_id)
        .with_context(|| format!("Failed to resolve model {}", ft.model_id))?;

    let tokenizer = tokenizers::Tokenizer::from_file(&assets.tokenizer)
        .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

    let model_config = match &assets.config {
        Some(path) => ModelConfig::from_file(path)?,
        None => ModelConfig::with_vocab(tokenizer.get_vocab_size(true)),
    };

    println!("Loading dataset {}...", ft.dataset);
    let dataset_path = DatasetSource::parse(&ft.dataset).fetch()?;
    let rows = dataset::load_jsonl(&dataset_path)?;
    let total = rows.len();

    let filter = DatasetFilter {
        min_avg_rating: ft.min_avg_rating,
        min_responses: ft.min_responses,
        max_rows: ft.max_rows,
    };
    let kept = filter.apply(rows);
    println!(
        "Dataset: {} rows loaded, {} kept (avg_rating >= {}, responses >= {})",
        total, kept.len(), ft.min_avg_rating, ft.min_responses
    );

    let (train_rows, eval_rows) = dataset::split_train_eval(kept, ft.eval_fraction);
    let train_tokens = dataset::tokenize_rows(&tokenizer, &train_rows)?;
    let eval_tokens = dataset::tokenize_rows(&tokenizer, &eval_rows)?;

    let device = candle_core::Device::cuda_if_available(0)?;
    if args.verbosity().show_detail() {
        println!("Training on {:?}", device);
    }

    let trainer_config = TrainerConfig {
        epochs: ft.epochs,
        batch_size: ft.batch_size,
        eval_steps: ft.eval_steps,
        learning_rate: ft.learning_rate,
        block_size: ft.block_size,
        seed: 42,
        output_dir: ft.output_dir.clone(),
        logging_dir: ft.logging_dir.clone(),
    };

    let mut trainer = Trainer::new(model_config, trainer_config, device)?;

    match &assets.weights {
        Some(weights) => match trainer.load_checkpoint(weights) {
            Ok(()) => println!("Loaded checkpoint from {}", weights.display()),
            Err(e) => println!(
                "{} incompatible checkpoint, training from initialization ({})",
                "Note:".yellow(),
                e
            ),
        },
        None => println!(
            "{} no checkpoint in repo, training from initialization",
            "Note:".yellow()
        ),
    }

    let report = trainer.train(&train_tokens, &eval_tokens)?;

    println!(
        "\n{} {} epochs, {} steps, final train loss {:.4}",
        "Finished:".green(),
        report.epochs,
        report.steps,
        report.final_train_loss
    );
    if let Some(eval_loss) = report.final_eval_loss {
        println!("Final eval loss {:.4}", eval_loss);
    }

    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    println!("Configuration file: {:?}", Config::config_path()?);
    println!();

    // The credential itself is never echoed.
    let mut redacted = config.clone();
    if redacted.embedding.api_key.is_some() {
        redacted.embedding.api_key = Some("<set>".to_string());
    }
    let rendered = toml::to_string_pretty(&redacted).context("Failed to render config")?;
    println!("{}", rendered);

    match config.resolve_api_key() {
        Ok(_) => println!("Embedding API key: {}", "configured".green()),
        Err(_) => println!("Embedding API key: {}", "missing".yellow()),
    }

    Ok(())
}

fn clean(config: &Config, logs: bool) -> Result<()> {
    let output_dir = &config.finetune.output_dir;
    if output_dir.exists() {
        std::fs::remove_dir_all(output_dir)
            .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
        println!("Removed {}", output_dir.display());
    } else {
        println!("No output directory at {}", output_dir.display());
    }

    if logs {
        let logging_dir = &config.finetune.logging_dir;
        if logging_dir.exists() {
            std::fs::remove_dir_all(logging_dir)
                .with_context(|| format!("Failed to remove {}", logging_dir.display()))?;
            println!("Removed {}", logging_dir.display());
        }
    }

    Ok(())
}
