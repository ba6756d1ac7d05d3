//! Generated documentation results.

use super::plan::DocStructurePlan;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn add(&mut self, input_tokens: usize, output_tokens: usize) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationStrategy {
    SingleShot,
    PerPage,
}

impl GenerationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleShot => "single-shot",
            Self::PerPage => "per-page",
        }
    }
}

/// A page whose generation call failed.
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub path: String,
    pub error: String,
}

/// Documentation produced by one generation run.
///
/// `files` maps sanitized output paths (`<output_dir>/<page>.md`) to content.
/// Token totals cover every generation call of the run; the planning call is
/// accounted for separately by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocs {
    pub files: BTreeMap<String, String>,
    pub total_input_tokens: usize,
    pub total_output_tokens: usize,
    pub strategy: GenerationStrategy,
    pub calls: usize,
    /// Planned pages followed by pages discovered during the run.
    pub plan: DocStructurePlan,
    pub failures: Vec<PageFailure>,
}

impl GeneratedDocs {
    pub fn new(strategy: GenerationStrategy, plan: DocStructurePlan) -> Self {
        Self {
            files: BTreeMap::new(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            strategy,
            calls: 0,
            plan,
            failures: Vec::new(),
        }
    }

    pub fn record_call(&mut self, input_tokens: usize, output_tokens: usize) {
        self.calls += 1;
        self.total_input_tokens += input_tokens;
        self.total_output_tokens += output_tokens;
    }

    /// Merge parsed pages; a repeated path overwrites the earlier content.
    pub fn merge(&mut self, pages: BTreeMap<String, String>) {
        self.files.extend(pages);
    }

    pub fn total_chars(&self) -> usize {
        self.files.values().map(|c| c.chars().count()).sum()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
