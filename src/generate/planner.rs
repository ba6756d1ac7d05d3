//! Documentation structure planning.
//!
//! One low-temperature call over the compressed rendering. The reply is parsed
//! leniently: missing fields get defaults, and an unusable reply falls back to
//! a fixed two-page plan. Only a failed call is an error.

use super::prompts::{planning_prompt, PLANNING_SYSTEM_PROMPT};
use super::sanitize::strip_output_prefix;
use crate::domain::{DocStructurePlan, PlannedFile, PlannedSection, RepoAnalysis, TokenUsage};
use crate::error::{GenerationError, PlanParseError};
use crate::llm::{GenerationRequest, Generator};
use crate::render::context::{render_compressed, DEFAULT_PREVIEW_LINES};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

pub const PLANNING_TEMPERATURE: f32 = 0.3;
pub const PLANNING_MAX_TOKENS: u32 = 4096;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex"));

static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

/// Plan used when the backend reply cannot be parsed.
pub fn default_plan() -> DocStructurePlan {
    DocStructurePlan {
        files: vec![
            PlannedFile {
                path: "index.md".to_string(),
                title: "Documentation".to_string(),
                description: "Main documentation page with overview".to_string(),
                sections: vec![
                    PlannedSection::new("Overview", "What the project does", 1),
                    PlannedSection::new("Features", "Key features and capabilities", 2),
                ],
                order: 1,
                source_files: Vec::new(),
            },
            PlannedFile {
                path: "getting-started.md".to_string(),
                title: "Getting Started".to_string(),
                description: "Installation and quick start guide".to_string(),
                sections: vec![
                    PlannedSection::new("Installation", "How to install", 1),
                    PlannedSection::new("Quick Start", "First steps", 2),
                    PlannedSection::new("Configuration", "Basic configuration", 3),
                ],
                order: 2,
                source_files: Vec::new(),
            },
        ],
        rationale: "Default structure for general projects".to_string(),
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn order_field(value: &Value, default: i64) -> i64 {
    match value.get("order") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn planned_file(value: &Value, index: usize) -> PlannedFile {
    let sections = value
        .get("sections")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(j, section)| PlannedSection {
                    heading: str_field(section, "heading")
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Section {}", j + 1)),
                    description: str_field(section, "description").unwrap_or_default().to_string(),
                    order: order_field(section, j as i64 + 1),
                })
                .collect()
        })
        .unwrap_or_default();

    let source_files = value.get("sourceFiles").or_else(|| value.get("source_files"));

    PlannedFile {
        path: str_field(value, "path")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| format!("file-{}.md", index + 1)),
        title: str_field(value, "title").unwrap_or("Untitled").to_string(),
        description: str_field(value, "description").unwrap_or_default().to_string(),
        sections,
        order: order_field(value, index as i64 + 1),
        source_files: string_list(source_files),
    }
}

fn plan_from_value(value: &Value) -> Result<DocStructurePlan, PlanParseError> {
    let files: Vec<PlannedFile> = value
        .get("files")
        .and_then(Value::as_array)
        .map(|items| items.iter().enumerate().map(|(i, item)| planned_file(item, i)).collect())
        .unwrap_or_default();

    if files.is_empty() {
        return Err(PlanParseError::InvalidJson("plan lists no files".to_string()));
    }

    Ok(DocStructurePlan {
        files,
        rationale: str_field(value, "rationale").unwrap_or_default().to_string(),
    })
}

/// Parse a planning reply.
///
/// A fenced code block is tried first, then the outermost braces.
pub fn parse_structure_plan(content: &str) -> Result<DocStructurePlan, PlanParseError> {
    let candidates: Vec<&str> = FENCED_BLOCK
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .into_iter()
        .chain(BRACED.find(content).map(|m| m.as_str()))
        .collect();

    if candidates.is_empty() {
        return Err(PlanParseError::NoJson);
    }

    let mut last_error = PlanParseError::NoJson;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate.trim()) {
            Ok(value) => match plan_from_value(&value) {
                Ok(plan) => return Ok(plan),
                Err(e) => last_error = e,
            },
            Err(e) => last_error = PlanParseError::InvalidJson(e.to_string()),
        }
    }
    Err(last_error)
}

/// Outcome of one planning call.
#[derive(Debug, Clone)]
pub struct PlanningResult {
    pub plan: DocStructurePlan,
    pub usage: TokenUsage,
    /// True when the reply was unusable and [`default_plan`] was substituted.
    pub fallback: bool,
}

pub struct StructurePlanner {
    generator: Arc<dyn Generator>,
    output_dir: String,
    preview_lines: usize,
}

impl StructurePlanner {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator, output_dir: "docs".to_string(), preview_lines: DEFAULT_PREVIEW_LINES }
    }

    /// Output directory prefix to strip from planned paths.
    pub fn with_output_dir(mut self, output_dir: impl Into<String>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_preview_lines(mut self, lines: usize) -> Self {
        self.preview_lines = lines;
        self
    }

    pub async fn plan(
        &self,
        analysis: &RepoAnalysis,
        guidelines: &str,
    ) -> Result<PlanningResult, GenerationError> {
        let context = render_compressed(analysis, guidelines, self.preview_lines);
        let request = GenerationRequest {
            system_prompt: PLANNING_SYSTEM_PROMPT.to_string(),
            prompt: planning_prompt(&context),
            max_tokens: PLANNING_MAX_TOKENS,
            temperature: PLANNING_TEMPERATURE,
        };

        tracing::info!(
            model = self.generator.name(),
            files = analysis.files.len(),
            "Planning documentation structure"
        );
        let response = self.generator.generate(&request).await?;
        let usage = TokenUsage {
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        };

        let (mut plan, fallback) = match parse_structure_plan(&response.content) {
            Ok(plan) => (plan, false),
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse structure plan; using default");
                (default_plan(), true)
            }
        };

        for file in &mut plan.files {
            let stripped = strip_output_prefix(&file.path, &self.output_dir).to_string();
            file.path = stripped;
        }

        tracing::info!(pages = plan.files.len(), fallback, "Planned documentation structure");
        Ok(PlanningResult { plan, usage, fallback })
    }
}
