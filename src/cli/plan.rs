//! Plan command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{BackendArgs, RepoArgs, Workspace};
use crate::generate::GenerationScheduler;
use crate::pipeline::DocPipeline;

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    #[command(flatten)]
    pub backend: BackendArgs,
}

pub async fn run(args: PlanArgs) -> Result<()> {
    let mut workspace = Workspace::open(&args.repo)?;
    workspace.apply_backend_args(&args.backend);

    let config = workspace.settings.generation.to_config(workspace.source.root());
    let output_dir = config.output_dir.clone();
    let scheduler = GenerationScheduler::new(workspace.backend()?, config)
        .with_context(|| format!("Invalid output directory: {}", output_dir))?;
    let pipeline = DocPipeline::new(workspace.assembler(), scheduler);

    let guidelines = workspace.guidelines(args.backend.guidelines.as_deref());
    let (analysis, planning) = pipeline
        .plan(&workspace.source, workspace.reference(&args.repo), &guidelines)
        .await?;
    tracing::debug!(
        files = analysis.files.len(),
        tokens = analysis.total_tokens,
        "Planned from analysis"
    );

    if planning.fallback {
        tracing::warn!("Backend reply was not a usable plan; showing the default structure");
    }
    println!("{}", serde_json::to_string_pretty(&planning.plan)?);
    Ok(())
}
