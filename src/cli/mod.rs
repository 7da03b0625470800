//! Command-line interface for Lumina

pub mod args;

pub use args::{Args, Commands, Verbosity};
