//! Shared CLI arguments and wiring.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::ContextAssembler;
use crate::config::{load_repo_config, load_settings, RepoConfig, Settings};
use crate::fetch::LocalSource;
use crate::llm::{default_counter, Generator, OpenAiCompatibleBackend};
use crate::redact::Redactor;

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Repository selection and analysis options.
#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Local repository path
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Git ref (branch/tag/SHA) to read instead of the working tree
    #[arg(long = "ref", value_name = "REF")]
    pub ref_: Option<String>,

    /// Path to settings file (repo-docs.toml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to repository documentation preferences (.repo-docs.yml)
    #[arg(long, value_name = "FILE")]
    pub repo_config: Option<PathBuf>,

    /// Token budget for analyzed file content
    #[arg(short = 't', long, value_name = "TOKENS")]
    pub max_tokens: Option<usize>,

    /// Only analyze paths matching these globs (comma-separated)
    #[arg(short = 'i', long, value_name = "GLOBS")]
    pub include: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude: Option<String>,

    /// Skip files larger than this (bytes)
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Do not redact secrets from file content
    #[arg(long)]
    pub no_redact: bool,

    /// Repository description passed to the backend
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Repository name shown to the backend (default: directory name)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Stop listing the repository after this many entries
    #[arg(long, value_name = "N")]
    pub max_entries: Option<usize>,
}

/// Generative backend and generation options.
#[derive(Args, Debug)]
pub struct BackendArgs {
    /// Model identifier
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Documentation guidelines (free text)
    #[arg(short = 'g', long, value_name = "TEXT")]
    pub guidelines: Option<String>,

    /// Output directory for generated pages, relative to the repository
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Per-page generation calls in flight
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Backend context window in tokens
    #[arg(long, value_name = "TOKENS")]
    pub context_limit: Option<usize>,
}

/// Everything a command needs after config files and flags are merged.
pub struct Workspace {
    pub source: LocalSource,
    pub settings: Settings,
    pub repo_config: RepoConfig,
}

impl Workspace {
    pub fn open(args: &RepoArgs) -> Result<Self> {
        let mut source = LocalSource::open(&args.path)
            .with_context(|| format!("Cannot open repository: {}", args.path.display()))?;
        if let Some(description) = &args.description {
            source = source.with_description(description.clone());
        }
        if let Some(name) = &args.name {
            source = source.with_name(name.clone());
        }
        if let Some(max) = args.max_entries {
            source = source.with_max_entries(max);
        }

        let mut settings = load_settings(source.root(), args.config.as_deref())?;
        let repo_config = load_repo_config(source.root(), args.repo_config.as_deref())?;

        if let Some(max_tokens) = args.max_tokens {
            settings.analysis.max_tokens = max_tokens;
        }
        if let Some(include) = parse_csv(&args.include) {
            settings.analysis.include_patterns = include;
        }
        if let Some(exclude) = parse_csv(&args.exclude) {
            settings.analysis.exclude_patterns.extend(exclude);
        }
        if let Some(bytes) = args.max_file_bytes {
            settings.analysis.max_file_size_bytes = bytes;
        }
        if args.no_redact {
            settings.analysis.redact_secrets = false;
        }
        if let Some(output_dir) = &repo_config.output_dir {
            settings.generation.output_dir = output_dir.clone();
        }

        Ok(Self { source, settings, repo_config })
    }

    /// CLI flags win over repository preferences, which win over settings files.
    pub fn apply_backend_args(&mut self, args: &BackendArgs) {
        if let Some(model) = &args.model {
            self.settings.backend.model = model.clone();
        }
        if let Some(base_url) = &args.base_url {
            self.settings.backend.base_url = base_url.clone();
        }
        if let Some(output_dir) = &args.output_dir {
            self.settings.generation.output_dir = output_dir.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.settings.generation.concurrency = concurrency;
        }
        if let Some(limit) = args.context_limit {
            self.settings.generation.context_limit = limit;
        }
    }

    pub fn reference<'a>(&self, args: &'a RepoArgs) -> Option<&'a str> {
        args.ref_.as_deref()
    }

    pub fn assembler(&self) -> ContextAssembler {
        let analysis = &self.settings.analysis;
        let redactor = analysis.redact_secrets.then(Redactor::new);
        ContextAssembler::new(analysis.max_tokens, default_counter())
            .with_filter(analysis.file_filter())
            .with_redactor(redactor)
    }

    pub fn backend(&self) -> Result<Arc<dyn Generator>> {
        let backend = &self.settings.backend;
        if backend.api_key().is_none() {
            tracing::debug!(
                env = %backend.api_key_env,
                "No API key set; sending unauthenticated requests"
            );
        }
        let client = OpenAiCompatibleBackend::new(
            &backend.base_url,
            &backend.model,
            backend.api_key(),
            backend.timeout(),
        )?;
        Ok(Arc::new(client))
    }

    /// Guidelines from the command line followed by repository preferences.
    pub fn guidelines(&self, cli: Option<&str>) -> String {
        [cli.unwrap_or_default().trim().to_string(), self.repo_config.to_prompt_context()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::parse_csv;

    #[test]
    fn csv_trims_and_drops_empty() {
        assert_eq!(
            parse_csv(&Some(" docs/** , ,vendor/**".to_string())),
            Some(vec!["docs/**".to_string(), "vendor/**".to_string()])
        );
        assert_eq!(parse_csv(&None), None);
    }
}
