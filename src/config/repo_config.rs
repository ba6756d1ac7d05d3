//! Repository documentation preferences (`.repo-docs.yml`).
//!
//! Free-text preferences a repository keeps next to its code. They are passed
//! to the backend as documentation guidelines.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const REPO_CONFIG_FILE_NAMES: &[&str] =
    &[".repo-docs.yml", ".repo-docs.yaml", "repo-docs.yml", "repo-docs.yaml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub include: String,
    pub exclude: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub code_examples: String,
    pub diagram_style: String,
    pub output_format: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            code_examples: String::new(),
            diagram_style: String::new(),
            output_format: "markdown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub guidelines: String,
    pub scope: ScopeConfig,
    pub style: StyleConfig,
    pub output_dir: Option<String>,
}

impl RepoConfig {
    /// Render as guideline text; empty when nothing is set.
    pub fn to_prompt_context(&self) -> String {
        let mut sections = Vec::new();

        if !self.guidelines.trim().is_empty() {
            sections.push(format!("## Documentation Guidelines\n{}", self.guidelines.trim()));
        }

        let mut scope = Vec::new();
        if !self.scope.include.is_empty() {
            scope.push(format!("**Include:** {}", self.scope.include));
        }
        if !self.scope.exclude.is_empty() {
            scope.push(format!("**Exclude:** {}", self.scope.exclude));
        }
        if !scope.is_empty() {
            sections.push(format!("## Scope\n{}", scope.join("\n")));
        }

        let mut style = Vec::new();
        if !self.style.code_examples.is_empty() {
            style.push(format!("**Code Examples:** {}", self.style.code_examples));
        }
        if !self.style.diagram_style.is_empty() {
            style.push(format!("**Diagrams:** {}", self.style.diagram_style));
        }
        if !style.is_empty() {
            sections.push(format!("## Style Preferences\n{}", style.join("\n")));
        }

        sections.join("\n\n")
    }
}

/// Parse YAML content. An empty document yields defaults.
pub fn parse_repo_config(content: &str) -> Result<RepoConfig> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content).context("Invalid YAML syntax")?;
    match raw {
        serde_yaml::Value::Null => Ok(RepoConfig::default()),
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(raw).context("Invalid repository config")
        }
        _ => anyhow::bail!("Repository config must be a YAML mapping"),
    }
}

fn discover_repo_config(repo_root: &Path) -> Option<PathBuf> {
    REPO_CONFIG_FILE_NAMES.iter().map(|name| repo_root.join(name)).find(|path| path.is_file())
}

/// Load repository preferences. Explicit files hard-fail; discovered files
/// soft-fail to defaults.
pub fn load_repo_config(repo_root: &Path, config_path: Option<&Path>) -> Result<RepoConfig> {
    let explicit = config_path.is_some();
    let Some(config_file) = config_path
        .map(Path::to_path_buf)
        .or_else(|| discover_repo_config(repo_root))
    else {
        return Ok(RepoConfig::default());
    };

    let parsed = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))
        .and_then(|content| parse_repo_config(&content))
        .with_context(|| format!("Invalid repository config: {}", config_file.display()));

    match parsed {
        Ok(config) => {
            tracing::debug!(path = %config_file.display(), "Loaded repository config");
            Ok(config)
        }
        Err(e) if !explicit => {
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(RepoConfig::default())
        }
        Err(e) => Err(e),
    }
}
