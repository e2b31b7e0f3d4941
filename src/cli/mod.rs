//! CLI entry point for Parley.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parley: a two-agent research dialogue runner
#[derive(Parser, Debug)]
#[command(
    name = "parley",
    version,
    about = "Run a User/Expert agent dialogue and distill takeaways"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, parley=trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a conversation from a config file
    Run(RunArgs),
    /// Load and validate a config file without calling the model
    Check(CheckArgs),
}

/// Arguments for `parley run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the config file (.json, .yaml, .yml or .toml)
    pub config: PathBuf,

    /// Override maxIterations (ignored unless positive)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub max_iterations: Option<i64>,

    /// Do not echo turns to stdout
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for `parley check`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the config file
    pub config: PathBuf,
}
