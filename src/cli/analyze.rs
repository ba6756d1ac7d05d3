//! Analyze command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{RepoArgs, Workspace};

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let workspace = Workspace::open(&args.repo)?;
    let analysis = workspace
        .assembler()
        .analyze(&workspace.source, workspace.reference(&args.repo))
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let repo = &analysis.repository;
    println!("Repository: {}", repo.name);
    if let Some(language) = &repo.language {
        println!("Language: {}", language);
    }
    println!("Default branch: {}", repo.default_branch);

    println!("Statistics:");
    println!("  Files included: {}", analysis.files.len());
    println!(
        "  Total tokens: {} / {}",
        analysis.total_tokens, workspace.settings.analysis.max_tokens
    );
    println!("  Truncated: {}", if analysis.truncated { "yes" } else { "no" });
    if analysis.listing_truncated {
        println!("  Listing truncated: yes");
    }

    let redacted: usize = analysis.redactions.values().sum();
    if redacted > 0 {
        println!("  Secrets redacted: {}", redacted);
    }

    if !analysis.skipped_files.is_empty() {
        println!("Skipped (budget):");
        for path in &analysis.skipped_files {
            println!("  {}", path);
        }
    }

    if !analysis.failed_files.is_empty() {
        println!("Failed to read:");
        for failed in &analysis.failed_files {
            println!("  {} ({})", failed.path, failed.reason);
        }
    }

    println!("\n{}", analysis.directory_structure);
    Ok(())
}
