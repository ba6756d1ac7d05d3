//! Command-line interface for repo-docs
//!
//! Provides `analyze`, `plan`, and `generate` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod analyze;
mod generate;
mod plan;
mod utils;

/// Generate documentation for a repository with an LLM backend
#[derive(Parser)]
#[command(name = "repo-docs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what would be sent to the backend: included files, budget, tree
    Analyze(analyze::AnalyzeArgs),

    /// Plan the documentation structure and print it as JSON
    Plan(Box<plan::PlanArgs>),

    /// Plan and generate documentation pages
    Generate(Box<generate::GenerateArgs>),
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Analyze(args) => analyze::run(args).await,
        Commands::Plan(args) => plan::run(*args).await,
        Commands::Generate(args) => generate::run(*args).await,
    }
}
