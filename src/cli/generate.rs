//! Generate command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::{BackendArgs, RepoArgs, Workspace};
use crate::generate::GenerationScheduler;
use crate::pipeline::DocPipeline;
use crate::render::{write_docs, write_report};

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Write the run report here (default: <repo>/repo-docs-report.json)
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Generate and report without writing pages
    #[arg(long)]
    pub dry_run: bool,

    /// Omit the timestamp from the report
    #[arg(long)]
    pub no_timestamp: bool,
}

pub async fn run(args: GenerateArgs) -> Result<()> {
    let mut workspace = Workspace::open(&args.repo)?;
    workspace.apply_backend_args(&args.backend);

    let config = workspace.settings.generation.to_config(workspace.source.root());
    let output_dir = config.output_dir.clone();
    let scheduler = GenerationScheduler::new(workspace.backend()?, config)
        .with_context(|| format!("Invalid output directory: {}", output_dir))?;
    let pipeline = DocPipeline::new(workspace.assembler(), scheduler);

    let guidelines = workspace.guidelines(args.backend.guidelines.as_deref());
    let result = pipeline
        .run(&workspace.source, workspace.reference(&args.repo), &guidelines)
        .await?;

    let root = workspace.source.root().to_path_buf();
    if args.dry_run {
        for path in result.docs.files.keys() {
            println!("  {}", path);
        }
    } else {
        let written = write_docs(&result.docs, &root, &output_dir)?;
        println!("Wrote {} pages to {}", written.len(), root.join(&output_dir).display());
    }

    let report_path = args.report.unwrap_or_else(|| root.join("repo-docs-report.json"));
    write_report(&report_path, &result, &workspace.settings.backend.model, !args.no_timestamp)?;

    let usage = result.total_usage();
    println!(
        "Strategy: {} ({} calls), tokens in/out: {}/{}",
        result.docs.strategy.as_str(),
        result.docs.calls + 1,
        usage.input_tokens,
        usage.output_tokens
    );
    if result.docs.is_partial() {
        println!("Failed pages:");
        for failure in &result.docs.failures {
            println!("  {} ({})", failure.path, failure.error);
        }
    }
    println!("Report: {}", report_path.display());
    Ok(())
}
