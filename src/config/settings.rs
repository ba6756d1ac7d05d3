//! Process settings.
//!
//! Layered with figment, lowest to highest precedence: built-in defaults, a
//! TOML file (`repo-docs.toml` in the repository root, or an explicit path),
//! `REPO_DOCS_*` environment variables (`__` separates nesting, e.g.
//! `REPO_DOCS_BACKEND__MODEL`). CLI flags are applied on top by the caller.

use crate::analysis::DEFAULT_MAX_TOKENS;
use crate::generate::scheduler::{
    DEFAULT_CONTEXT_LIMIT, DEFAULT_OUTPUT_BUDGET, DEFAULT_PROMPT_OVERHEAD, DEFAULT_TEMPERATURE,
};
use crate::generate::GenerationConfig;
use crate::llm::backend::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::render::DEFAULT_PREVIEW_LINES;
use crate::scan::{FileFilter, DEFAULT_MAX_FILE_SIZE_BYTES};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE_NAME: &str = "repo-docs.toml";
pub const ENV_PREFIX: &str = "REPO_DOCS_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub analysis: AnalysisSettings,
    pub generation: GenerationSettings,
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "REPO_DOCS_API_KEY".to_string(),
            timeout_secs: 600,
        }
    }
}

impl BackendSettings {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Token budget for analyzed file content
    pub max_tokens: usize,
    pub max_file_size_bytes: u64,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub use_default_excludes: bool,
    pub redact_secrets: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            use_default_excludes: true,
            redact_secrets: true,
        }
    }
}

impl AnalysisSettings {
    pub fn file_filter(&self) -> FileFilter {
        let filter = if self.use_default_excludes {
            FileFilter::new()
        } else {
            FileFilter::without_default_excludes()
        };
        filter
            .max_file_size_bytes(self.max_file_size_bytes)
            .include_patterns(self.include_patterns.as_slice())
            .exclude_patterns(self.exclude_patterns.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub output_dir: String,
    /// Backend context window in tokens
    pub context_limit: usize,
    pub output_budget: u32,
    pub prompt_overhead: usize,
    pub temperature: f32,
    pub preview_lines: usize,
    pub concurrency: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            output_dir: "docs".to_string(),
            context_limit: DEFAULT_CONTEXT_LIMIT,
            output_budget: DEFAULT_OUTPUT_BUDGET,
            prompt_overhead: DEFAULT_PROMPT_OVERHEAD,
            temperature: DEFAULT_TEMPERATURE,
            preview_lines: DEFAULT_PREVIEW_LINES,
            concurrency: 1,
        }
    }
}

impl GenerationSettings {
    /// Generation settings for the repository at `root`.
    pub fn to_config(&self, root: &Path) -> GenerationConfig {
        GenerationConfig {
            root: root.to_path_buf(),
            output_dir: self.output_dir.clone(),
            context_limit: self.context_limit,
            output_budget: self.output_budget,
            prompt_overhead: self.prompt_overhead,
            temperature: self.temperature,
            preview_lines: self.preview_lines,
            concurrency: self.concurrency.max(1),
        }
    }
}

fn layered(file: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = file {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load settings for a repository.
///
/// An explicit file must exist and parse. A discovered `repo-docs.toml` that
/// fails to parse is ignored with a warning.
pub fn load_settings(repo_root: &Path, config_path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = config_path {
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return layered(Some(path))
            .extract()
            .with_context(|| format!("Invalid config file: {}", path.display()));
    }

    let discovered: Option<PathBuf> =
        Some(repo_root.join(SETTINGS_FILE_NAME)).filter(|p| p.is_file());
    match layered(discovered.as_deref()).extract() {
        Ok(settings) => Ok(settings),
        Err(e) if discovered.is_some() => {
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {}",
                repo_root.join(SETTINGS_FILE_NAME).display(),
                e
            );
            layered(None).extract().context("Failed to load configuration")
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_file() {
        let tmp = TempDir::new().expect("tmp");
        let settings = load_settings(tmp.path(), None).expect("settings");
        assert_eq!(settings.analysis.max_tokens, 100_000);
        assert_eq!(settings.generation.context_limit, 200_000);
        assert_eq!(settings.generation.output_budget, 16_384);
        assert_eq!(settings.generation.output_dir, "docs");
        assert!(settings.analysis.redact_secrets);
    }

    #[test]
    fn discovered_toml_overrides_defaults() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join(SETTINGS_FILE_NAME),
            "[analysis]\nmax_tokens = 5000\nexclude_patterns = [\"legacy/**\"]\n\n\
             [generation]\nconcurrency = 3\n",
        )
        .expect("write");

        let settings = load_settings(tmp.path(), None).expect("settings");
        assert_eq!(settings.analysis.max_tokens, 5000);
        assert_eq!(settings.analysis.exclude_patterns, vec!["legacy/**"]);
        assert_eq!(settings.generation.concurrency, 3);
        assert_eq!(settings.backend, BackendSettings::default());
    }

    #[test]
    fn broken_discovered_file_soft_fails() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join(SETTINGS_FILE_NAME), "[analysis]\nmax_tokens = \"lots\"\n")
            .expect("write");
        let settings = load_settings(tmp.path(), None).expect("should not error on auto-discovery");
        assert_eq!(settings.analysis.max_tokens, 100_000);
    }

    #[test]
    fn broken_explicit_file_is_an_error() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[generation]\nconcurrency = \"many\"\n").expect("write");
        assert!(load_settings(tmp.path(), Some(&path)).is_err());
        assert!(load_settings(tmp.path(), Some(&tmp.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn file_filter_honors_settings() {
        let analysis = AnalysisSettings {
            exclude_patterns: vec!["legacy/**".into()],
            max_file_size_bytes: 10,
            ..Default::default()
        };
        let filter = analysis.file_filter();
        assert!(!filter.should_include("legacy/old.py", 5));
        assert!(!filter.should_include("src/main.py", 50));
        assert!(filter.should_include("src/main.py", 5));
    }

    #[test]
    fn generation_config_is_rooted_at_the_repository() {
        let tmp = TempDir::new().expect("tmp");
        let generation = GenerationSettings { concurrency: 0, ..Default::default() };
        let config = generation.to_config(tmp.path());
        assert_eq!(config.root, tmp.path());
        assert_eq!(config.output_dir, "docs");
        assert_eq!(config.concurrency, 1);
    }
}
