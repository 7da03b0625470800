//! Command-line argument parsing for Lumina
//!
//! Provides clap-based CLI with subcommands and verbosity control.
//! Flags override values from the config file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lumina - accelerator probe, retrieval indexing, and fine-tuning
#[derive(Parser, Debug)]
#[command(name = "lumina")]
#[command(version)]
#[command(about = "ML workbench: probe the accelerator, build a retrieval index, fine-tune a model", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report backend version, CUDA availability, and GPU devices
    Probe,

    /// Fetch configured pages, chunk, embed, and build the retrieval index
    Index {
        /// Run these queries against the index after building it
        #[arg(long = "query", value_name = "QUERY")]
        queries: Vec<String>,

        /// Source URLs (replaces the configured list)
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,

        /// Chunk size in estimated tokens
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Chunk overlap in estimated tokens
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Number of results per query
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Fine-tune the configured model on the ranked prompt dataset
    Finetune {
        /// Model repo on the Hub
        #[arg(long)]
        model: Option<String>,

        /// Dataset repo on the Hub, or a local JSONL path
        #[arg(long)]
        dataset: Option<String>,

        /// Number of training epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Per-step batch size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Evaluate every N steps
        #[arg(long)]
        eval_steps: Option<usize>,
    },

    /// Display current configuration
    Config,

    /// Remove training output directory
    Clean {
        /// Also remove step logs
        #[arg(long)]
        logs: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

impl Verbosity {
    /// Check if progress bars should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if per-step detail should be shown
    pub fn show_detail(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}
