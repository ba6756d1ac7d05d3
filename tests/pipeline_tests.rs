//! Integration tests for the documentation pipeline

use async_trait::async_trait;
use repo_docs::analysis::ContextAssembler;
use repo_docs::domain::GenerationStrategy;
use repo_docs::error::GenerationError;
use repo_docs::fetch::MemorySource;
use repo_docs::generate::{default_plan, GenerationConfig, GenerationScheduler, ResponseParser};
use repo_docs::llm::{GenerationRequest, GenerationResponse, Generator, TokenCounter};
use repo_docs::render::write_docs;
use repo_docs::scan::FileFilter;
use repo_docs::DocPipeline;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One token per whitespace-separated word.
struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &str {
        "words"
    }
}

/// Answers the first rule whose needle appears in the prompt.
struct ScriptedBackend {
    rules: Vec<(&'static str, &'static str)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(rules: Vec<(&'static str, &'static str)>) -> Arc<Self> {
        Arc::new(Self { rules, prompts: Mutex::new(Vec::new()) })
    }

    fn calls_matching(&self, needle: &str) -> usize {
        self.prompts.lock().expect("lock").iter().filter(|p| p.contains(needle)).count()
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().expect("lock").len()
    }
}

#[async_trait]
impl Generator for ScriptedBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.prompts.lock().expect("lock").push(request.prompt.clone());
        let content = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle))
            .map(|(_, reply)| reply.to_string())
            .ok_or_else(|| GenerationError::Other("no scripted reply".into()))?;
        Ok(GenerationResponse { content, input_tokens: 10, output_tokens: 5 })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

fn assembler(max_tokens: usize) -> ContextAssembler {
    ContextAssembler::new(max_tokens, Arc::new(WordCounter))
}

#[test]
fn default_excludes_drop_dependency_directories() {
    let filter = FileFilter::new();
    assert!(!filter.should_include("node_modules/x/index.js", 10));
    assert!(filter.should_include("src/index.js", 10));
}

#[tokio::test]
async fn budget_skips_overflowing_file_and_keeps_filling() {
    let source = MemorySource::new("demo")
        .with_file("README.md", words(10))
        .with_file("main.py", words(60))
        .with_file("utils.py", words(5));

    let analysis = assembler(50).analyze(&source, None).await.expect("analysis");
    let paths: Vec<&str> = analysis.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "utils.py"]);
    assert_eq!(analysis.skipped_files, vec!["main.py"]);
    assert!(analysis.truncated);
    assert_eq!(analysis.total_tokens, 15);
}

#[test]
fn traversal_in_generated_marker_stays_in_output_dir() {
    let tmp = TempDir::new().expect("tmp");
    let parser = ResponseParser::new(tmp.path(), "docs").expect("parser");
    let pages = parser.parse("<!-- FILE: ../../etc/passwd -->\nhi");
    assert_eq!(pages.len(), 1);
    for path in pages.keys() {
        assert!(path.starts_with("docs/"), "{path}");
        assert!(!path.contains(".."), "{path}");
    }
    assert_eq!(pages.get("docs/etc/passwd.md").map(String::as_str), Some("hi"));
}

#[tokio::test]
async fn oversized_repo_generates_per_page_with_discovered_pages() {
    let source = MemorySource::new("demo")
        .with_description("A library for parsing things")
        .with_file("README.md", words(200))
        .with_file("src/core.py", words(300))
        .with_file("src/plugins.py", words(300));

    let backend = ScriptedBackend::new(vec![
        (
            "Plan the documentation structure",
            r#"```json
{"files": [
  {"path": "docs/index.md", "title": "Overview", "order": 1, "sourceFiles": ["README.md"]},
  {"path": "core.md", "title": "Core", "order": 2, "sourceFiles": ["src/core.py"]}
], "rationale": "two topics"}
```"#,
        ),
        (
            "Page path: index.md",
            "<!-- FILE: index.md -->\n# Overview\n\
             <!-- SUGGEST_PAGE: plugins.md | Plugins | Plugin loading | src/plugins.py -->",
        ),
        (
            "Page path: core.md",
            "<!-- FILE: core.md -->\n# Core\n\
             <!-- SUGGEST_PAGE: docs/plugins.md | Plugins | Same page again | src/plugins.py -->\n\
             <!-- SUGGEST_PAGE: ./plugins | Plugins | And again -->",
        ),
        ("Page path: plugins.md", "<!-- FILE: plugins.md -->\n# Plugins"),
    ]);

    // 1_000 tokens of input room against an 800-token analysis plus overhead.
    let tmp = TempDir::new().expect("tmp");
    let config = GenerationConfig {
        context_limit: 1_000 + 16_384 + 7_000,
        prompt_overhead: 500,
        ..Default::default()
    }
    .with_root(tmp.path());
    let scheduler = GenerationScheduler::new(backend.clone(), config).expect("scheduler");
    let pipeline = DocPipeline::new(assembler(10_000), scheduler);

    let result = pipeline.run(&source, None, "").await.expect("run");
    assert_eq!(result.docs.strategy, GenerationStrategy::PerPage);
    assert_eq!(result.plan.file_paths(), vec!["index.md", "core.md"]);
    assert_eq!(backend.calls_matching("Page path: plugins.md"), 1);
    assert_eq!(backend.call_count(), 4, "plan + two planned pages + one discovered");
    assert_eq!(result.docs.calls, 3);
    assert_eq!(
        result.docs.files.keys().collect::<Vec<_>>(),
        vec!["docs/core.md", "docs/index.md", "docs/plugins.md"]
    );
    assert_eq!(result.docs.plan.files.len(), 3);
    assert_eq!(result.total_usage().input_tokens, 40);

    let written = write_docs(&result.docs, tmp.path(), "docs").expect("write");
    assert_eq!(written.len(), 3);
    assert!(tmp.path().join("docs/plugins.md").exists());
}

#[tokio::test]
async fn prose_plan_reply_uses_default_plan() {
    let source = MemorySource::new("demo").with_file("README.md", words(20));
    let backend = ScriptedBackend::new(vec![
        (
            "Plan the documentation structure",
            "Here is how I would structure the docs: start with an overview.",
        ),
        (
            "Write the complete documentation",
            "<!-- FILE: index.md -->\n# Demo\n<!-- FILE: getting-started.md -->\n# Getting Started",
        ),
    ]);
    let tmp = TempDir::new().expect("tmp");
    let config = GenerationConfig::default().with_root(tmp.path());
    let scheduler = GenerationScheduler::new(backend.clone(), config).expect("scheduler");
    let pipeline = DocPipeline::new(assembler(1_000), scheduler);

    let result = pipeline.run(&source, None, "Write for developers").await.expect("run");
    assert!(result.plan_fallback);
    assert_eq!(result.plan, default_plan());
    assert_eq!(result.docs.strategy, GenerationStrategy::SingleShot);
    assert_eq!(result.docs.calls, 1);
    assert_eq!(result.docs.files.len(), 2);
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn planning_transport_failure_is_an_error() {
    let source = MemorySource::new("demo").with_file("README.md", words(5));
    let backend = ScriptedBackend::new(Vec::new());
    let tmp = TempDir::new().expect("tmp");
    let config = GenerationConfig::default().with_root(tmp.path());
    let scheduler = GenerationScheduler::new(backend, config).expect("scheduler");
    let pipeline = DocPipeline::new(assembler(1_000), scheduler);

    let err = pipeline.run(&source, None, "").await.expect_err("no reply scripted");
    assert!(matches!(err, repo_docs::PipelineError::Generation(_)));
}
