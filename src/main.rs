//! repo-docs: generate documentation for a repository with an LLM backend

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    repo_docs::cli::run().await
}
