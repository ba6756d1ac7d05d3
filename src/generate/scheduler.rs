//! Generation scheduling.
//!
//! A run moves through `Unplanned → Planned → (SingleShot | PerPage) → Complete`.
//! Single-shot sends the full rendering in one call when it fits the backend's
//! context window; otherwise each planned page is generated from its own source
//! subset, and pages suggested by responses are queued behind the plan.

use super::parser::{parse_page_suggestions, ResponseParser};
use super::planner::{PlanningResult, StructurePlanner};
use super::prompts::{page_prompt, single_shot_prompt, GENERATION_SYSTEM_PROMPT};
use super::sanitize::{normalize_doc_path, strip_output_prefix};
use crate::domain::{
    DocStructurePlan, GeneratedDocs, GenerationStrategy, PageFailure, PlannedFile, RepoAnalysis,
};
use crate::error::{GenerationError, PathRejected};
use crate::llm::{GenerationRequest, Generator};
use crate::render::context::{render_full, render_subset, DEFAULT_PREVIEW_LINES};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_CONTEXT_LIMIT: usize = 200_000;
pub const DEFAULT_OUTPUT_BUDGET: u32 = 16_384;
pub const SYSTEM_PROMPT_BUDGET: usize = 2_000;
pub const SAFETY_MARGIN: usize = 5_000;
/// Tokens reserved for prompt scaffolding around the rendered context.
pub const DEFAULT_PROMPT_OVERHEAD: usize = 3_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Repository the documentation belongs to; `output_dir` is relative to it.
    pub root: PathBuf,
    pub output_dir: String,
    pub context_limit: usize,
    pub output_budget: u32,
    pub prompt_overhead: usize,
    pub temperature: f32,
    pub preview_lines: usize,
    /// Per-page calls allowed in flight at once.
    pub concurrency: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
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

impl GenerationConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Input tokens a single-shot call may use.
    pub fn available_context(&self) -> usize {
        self.context_limit
            .saturating_sub(self.output_budget as usize)
            .saturating_sub(SYSTEM_PROMPT_BUDGET)
            .saturating_sub(SAFETY_MARGIN)
    }
}

#[derive(Clone, Copy)]
struct PromptInputs<'a> {
    guidelines: &'a str,
    audience_context: &'a str,
}

enum State {
    Unplanned,
    Planned(DocStructurePlan),
    SingleShot(DocStructurePlan),
    PerPage(DocStructurePlan),
    Complete(GeneratedDocs),
}

#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub planning: PlanningResult,
    pub docs: GeneratedDocs,
}

pub struct GenerationScheduler {
    generator: Arc<dyn Generator>,
    planner: StructurePlanner,
    parser: ResponseParser,
    config: GenerationConfig,
}

impl GenerationScheduler {
    pub fn new(
        generator: Arc<dyn Generator>,
        config: GenerationConfig,
    ) -> Result<Self, PathRejected> {
        let planner = StructurePlanner::new(generator.clone())
            .with_output_dir(config.output_dir.clone())
            .with_preview_lines(config.preview_lines);
        let parser = ResponseParser::new(&config.root, &config.output_dir)?;
        Ok(Self { generator, planner, parser, config })
    }

    pub fn planner(&self) -> &StructurePlanner {
        &self.planner
    }

    pub fn estimated_tokens(&self, analysis: &RepoAnalysis) -> usize {
        analysis.total_tokens + self.config.prompt_overhead
    }

    pub fn choose_strategy(&self, analysis: &RepoAnalysis) -> GenerationStrategy {
        if self.estimated_tokens(analysis) <= self.config.available_context() {
            GenerationStrategy::SingleShot
        } else {
            GenerationStrategy::PerPage
        }
    }

    /// Plan, then generate.
    pub async fn run(
        &self,
        analysis: &RepoAnalysis,
        guidelines: &str,
        audience_context: &str,
    ) -> Result<ScheduleOutcome, GenerationError> {
        let mut planning = None;
        let prompt = PromptInputs { guidelines, audience_context };
        let docs = self.drive(State::Unplanned, analysis, prompt, &mut planning).await?;
        let planning = planning
            .ok_or_else(|| GenerationError::Other("run finished without a plan".into()))?;
        Ok(ScheduleOutcome { planning, docs })
    }

    /// Generate from an existing plan.
    pub async fn run_with_plan(
        &self,
        analysis: &RepoAnalysis,
        plan: DocStructurePlan,
        guidelines: &str,
        audience_context: &str,
    ) -> Result<GeneratedDocs, GenerationError> {
        let prompt = PromptInputs { guidelines, audience_context };
        self.drive(State::Planned(plan), analysis, prompt, &mut None).await
    }

    async fn drive(
        &self,
        mut state: State,
        analysis: &RepoAnalysis,
        prompt: PromptInputs<'_>,
        planning: &mut Option<PlanningResult>,
    ) -> Result<GeneratedDocs, GenerationError> {
        loop {
            state = match state {
                State::Unplanned => {
                    let result = self.planner.plan(analysis, prompt.guidelines).await?;
                    let plan = result.plan.clone();
                    *planning = Some(result);
                    State::Planned(plan)
                }
                State::Planned(plan) => {
                    let strategy = self.choose_strategy(analysis);
                    tracing::info!(
                        strategy = strategy.as_str(),
                        estimated = self.estimated_tokens(analysis),
                        available = self.config.available_context(),
                        "Selected generation strategy"
                    );
                    match strategy {
                        GenerationStrategy::SingleShot => State::SingleShot(plan),
                        GenerationStrategy::PerPage => State::PerPage(plan),
                    }
                }
                State::SingleShot(plan) => {
                    State::Complete(self.single_shot(analysis, plan, prompt).await?)
                }
                State::PerPage(plan) => {
                    State::Complete(self.per_page(analysis, plan, prompt).await?)
                }
                State::Complete(docs) => return Ok(docs),
            };
        }
    }

    fn request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            system_prompt: GENERATION_SYSTEM_PROMPT.to_string(),
            prompt,
            max_tokens: self.config.output_budget,
            temperature: self.config.temperature,
        }
    }

    /// Normalized relative path used to recognize a page regardless of how it was written.
    fn page_key(&self, path: &str) -> Option<String> {
        normalize_doc_path(strip_output_prefix(path, &self.config.output_dir)).ok()
    }

    async fn single_shot(
        &self,
        analysis: &RepoAnalysis,
        plan: DocStructurePlan,
        inputs: PromptInputs<'_>,
    ) -> Result<GeneratedDocs, GenerationError> {
        let context = render_full(analysis, inputs.guidelines);
        let prompt =
            single_shot_prompt(&context, &plan.to_prompt_context(), inputs.audience_context);

        tracing::info!(pages = plan.files.len(), "Generating documentation in one call");
        let response = self.generator.generate(&self.request(prompt)).await?;

        let mut docs = GeneratedDocs::new(GenerationStrategy::SingleShot, plan);
        docs.record_call(response.input_tokens, response.output_tokens);
        docs.merge(self.parser.parse(&response.content));
        Ok(docs)
    }

    async fn per_page(
        &self,
        analysis: &RepoAnalysis,
        plan: DocStructurePlan,
        inputs: PromptInputs<'_>,
    ) -> Result<GeneratedDocs, GenerationError> {
        let plan_context = plan.to_prompt_context();
        let mut queue: VecDeque<PlannedFile> = plan.sorted_files().into_iter().cloned().collect();
        let mut known: HashSet<String> = plan
            .files
            .iter()
            .map(|f| self.page_key(&f.path).unwrap_or_else(|| f.path.clone()))
            .collect();

        let mut docs = GeneratedDocs::new(GenerationStrategy::PerPage, plan);
        let mut written: BTreeMap<String, String> = BTreeMap::new();
        let mut first_error: Option<GenerationError> = None;
        let concurrency = self.config.concurrency.max(1);
        let generator: &dyn Generator = self.generator.as_ref();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < concurrency {
                let Some(page) = queue.pop_front() else {
                    break;
                };
                let context = render_subset(analysis, &page.source_files, inputs.guidelines);
                let prompt = page_prompt(
                    &context,
                    &page,
                    &plan_context,
                    inputs.audience_context,
                    &written,
                );
                let request = self.request(prompt);
                tracing::info!(path = %page.path, order = page.order, "Generating page");
                in_flight.push(async move {
                    let result = generator.generate(&request).await;
                    (page, result)
                });
            }

            let Some((page, result)) = in_flight.next().await else {
                break;
            };

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(path = %page.path, error = %e, "Page generation failed");
                    docs.failures
                        .push(PageFailure { path: page.path.clone(), error: e.to_string() });
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            docs.record_call(response.input_tokens, response.output_tokens);
            let pages = self.parser.parse(&response.content);
            for path in pages.keys() {
                written.insert(path.clone(), page.title.clone());
            }
            docs.merge(pages);

            for suggestion in parse_page_suggestions(&response.content) {
                let Some(key) = self.page_key(&suggestion.path) else {
                    tracing::debug!(path = %suggestion.path, "Ignoring unusable page suggestion");
                    continue;
                };
                let output_key = self.parser.sanitizer().output_key(&key);
                if docs.files.contains_key(&output_key) || !known.insert(key.clone()) {
                    continue;
                }

                tracing::info!(path = %key, from = %page.path, "Discovered page");
                let mut discovered = suggestion.into_planned_file();
                discovered.path = key;
                docs.plan.files.push(discovered.clone());
                queue.push_back(discovered);
            }
        }

        if docs.calls == 0 {
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        if docs.is_partial() {
            tracing::warn!(
                failed = docs.failures.len(),
                succeeded = docs.calls,
                "Documentation is partial"
            );
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalyzedFile, PlannedSection, RepositoryMeta};
    use crate::llm::GenerationResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replies by the page named in the prompt and records every prompt.
    struct Scripted {
        replies: Vec<(&'static str, Result<&'static str, ()>)>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<(&'static str, Result<&'static str, ()>)>) -> Arc<Self> {
            Arc::new(Self { replies, prompts: Mutex::new(Vec::new()) })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("lock").clone()
        }

        /// Position of the first prompt containing `needle`.
        fn requested_at(&self, needle: &str) -> usize {
            self.prompts().iter().position(|p| p.contains(needle)).expect("page was requested")
        }
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, GenerationError> {
            self.prompts.lock().expect("lock").push(request.prompt.clone());
            let reply = self
                .replies
                .iter()
                .find(|(needle, _)| request.prompt.contains(needle))
                .map(|(_, reply)| *reply)
                .unwrap_or(Ok("<!-- FILE: fallback.md -->\nfallback"));
            match reply {
                Ok(content) => Ok(GenerationResponse {
                    content: content.to_string(),
                    input_tokens: 100,
                    output_tokens: 10,
                }),
                Err(()) => Err(GenerationError::Status { status: 500, body: "boom".into() }),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn file(path: &str, content: &str, tokens: usize) -> AnalyzedFile {
        AnalyzedFile {
            path: path.to_string(),
            content: content.to_string(),
            size: content.len() as u64,
            extension: crate::domain::extension_of(path),
            token_count: tokens,
        }
    }

    fn analysis(total_tokens: usize) -> RepoAnalysis {
        RepoAnalysis {
            repository: RepositoryMeta { name: "demo".into(), ..Default::default() },
            files: vec![file("src/a.py", "A_SOURCE", 10), file("src/b.py", "B_SOURCE", 10)],
            directory_structure: "src".into(),
            total_tokens,
            truncated: false,
            skipped_files: Vec::new(),
            failed_files: Vec::new(),
            listing_truncated: false,
            redactions: Default::default(),
        }
    }

    fn page(path: &str, order: i64, sources: &[&str]) -> PlannedFile {
        PlannedFile {
            path: path.to_string(),
            title: path.trim_end_matches(".md").to_string(),
            description: String::new(),
            sections: vec![PlannedSection::new("Intro", "", 1)],
            order,
            source_files: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn two_page_plan() -> DocStructurePlan {
        DocStructurePlan {
            files: vec![page("arch.md", 2, &["src/b.py"]), page("index.md", 1, &["src/a.py"])],
            rationale: String::new(),
        }
    }

    fn per_page_config() -> GenerationConfig {
        // Leaves 1_000 tokens of input room.
        GenerationConfig {
            context_limit: 1_000 + 16_384 + 7_000,
            prompt_overhead: 0,
            ..Default::default()
        }
    }

    /// Scheduler confined to a scratch repository root.
    fn scheduler_in(
        tmp: &TempDir,
        generator: Arc<Scripted>,
        config: GenerationConfig,
    ) -> GenerationScheduler {
        GenerationScheduler::new(generator, config.with_root(tmp.path())).expect("scheduler")
    }

    #[test]
    fn available_context_reserves_output_and_margins() {
        let config = GenerationConfig::default();
        assert_eq!(config.available_context(), 200_000 - 16_384 - 2_000 - 5_000);
        let tiny = GenerationConfig { context_limit: 10, ..Default::default() };
        assert_eq!(tiny.available_context(), 0);
    }

    #[tokio::test]
    async fn small_repo_uses_one_call() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![(
            "Write the complete documentation",
            Ok("<!-- FILE: index.md -->\n# Home\n<!-- FILE: arch.md -->\n# Arch"),
        )]);
        let scheduler = scheduler_in(&tmp, generator.clone(), GenerationConfig::default());
        assert_eq!(scheduler.choose_strategy(&analysis(3_000)), GenerationStrategy::SingleShot);

        let docs = scheduler
            .run_with_plan(&analysis(3_000), two_page_plan(), "", "")
            .await
            .expect("docs");
        assert_eq!(docs.strategy, GenerationStrategy::SingleShot);
        assert_eq!(docs.calls, 1);
        assert_eq!(docs.files.len(), 2);
        assert_eq!(docs.total_input_tokens, 100);
        assert!(generator.prompts()[0].contains("A_SOURCE"));
    }

    #[tokio::test]
    async fn per_page_generation_queues_suggestions_once() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![
            (
                "Page path: index.md",
                Ok("<!-- FILE: index.md -->\n# Index\n\
                    <!-- SUGGEST_PAGE: docs/extra.md | Extra | More | src/b.py -->"),
            ),
            (
                "Page path: arch.md",
                Ok("<!-- FILE: arch.md -->\n# Arch\n\
                    <!-- SUGGEST_PAGE: extra.md | Extra again | Dup | src/a.py -->"),
            ),
            ("Page path: extra.md", Ok("<!-- FILE: extra.md -->\n# Extra")),
        ]);
        let scheduler = scheduler_in(&tmp, generator.clone(), per_page_config());
        let analysis = analysis(5_000);
        assert_eq!(scheduler.choose_strategy(&analysis), GenerationStrategy::PerPage);

        let docs = scheduler.run_with_plan(&analysis, two_page_plan(), "", "").await.expect("docs");
        assert_eq!(docs.strategy, GenerationStrategy::PerPage);
        assert_eq!(docs.calls, 3);
        assert_eq!(
            docs.files.keys().collect::<Vec<_>>(),
            vec!["docs/arch.md", "docs/extra.md", "docs/index.md"]
        );
        assert_eq!(docs.total_input_tokens, 300);
        assert_eq!(docs.plan.files.len(), 3);
        assert_eq!(docs.plan.files[2].order, crate::domain::DISCOVERED_PAGE_ORDER);

        let prompts = generator.prompts();
        assert!(prompts[0].contains("Page path: index.md"), "planned order respected");
        assert!(prompts[0].contains("A_SOURCE") && !prompts[0].contains("B_SOURCE"));
        assert!(prompts[1].contains("Page path: arch.md"));
        assert!(prompts[1].contains("- docs/index.md: index"), "written pages listed");
        assert!(prompts[2].contains("Page path: extra.md"));
        assert!(prompts[2].contains("B_SOURCE"));
    }

    #[tokio::test]
    async fn dotted_output_dir_dedups_suggestions() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![
            (
                "Page path: index.md",
                Ok("<!-- FILE: docs/index.md -->\n# Index\n\
                    <!-- SUGGEST_PAGE: docs/extra.md | Extra | More -->\n\
                    <!-- SUGGEST_PAGE: extra.md | Extra | Same page -->\n\
                    <!-- SUGGEST_PAGE: ./docs/extra | Extra | Same again -->"),
            ),
            ("Page path: extra.md", Ok("<!-- FILE: extra.md -->\n# Extra")),
        ]);
        let config = GenerationConfig { output_dir: "./docs".into(), ..per_page_config() };
        let scheduler = scheduler_in(&tmp, generator.clone(), config);
        let plan = DocStructurePlan {
            files: vec![page("index.md", 1, &["src/a.py"])],
            rationale: String::new(),
        };

        let docs = scheduler.run_with_plan(&analysis(5_000), plan, "", "").await.expect("docs");
        assert_eq!(docs.calls, 2, "same suggested page generated once");
        assert_eq!(docs.files.keys().collect::<Vec<_>>(), vec!["docs/extra.md", "docs/index.md"]);
    }

    #[tokio::test]
    async fn failed_page_is_recorded_and_run_continues() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![
            ("Page path: index.md", Err(())),
            ("Page path: arch.md", Ok("<!-- FILE: arch.md -->\n# Arch")),
        ]);
        let scheduler = scheduler_in(&tmp, generator, per_page_config());

        let docs = scheduler
            .run_with_plan(&analysis(5_000), two_page_plan(), "", "")
            .await
            .expect("docs");
        assert!(docs.is_partial());
        assert_eq!(docs.failures[0].path, "index.md");
        assert_eq!(docs.files.keys().collect::<Vec<_>>(), vec!["docs/arch.md"]);
    }

    #[tokio::test]
    async fn all_pages_failing_returns_first_error() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![("Page path:", Err(()))]);
        let scheduler = scheduler_in(&tmp, generator, per_page_config());

        let err = scheduler
            .run_with_plan(&analysis(5_000), two_page_plan(), "", "")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn concurrent_pages_all_complete() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![
            ("Page path: index.md", Ok("<!-- FILE: index.md -->\n# Index")),
            ("Page path: arch.md", Ok("<!-- FILE: arch.md -->\n# Arch")),
        ]);
        let config = GenerationConfig { concurrency: 4, ..per_page_config() };
        let scheduler = scheduler_in(&tmp, generator, config);

        let docs = scheduler
            .run_with_plan(&analysis(5_000), two_page_plan(), "", "")
            .await
            .expect("docs");
        assert_eq!(docs.calls, 2);
        assert_eq!(docs.files.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_discoveries_follow_every_planned_page() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![
            (
                "Page path: intro.md",
                Ok("<!-- FILE: intro.md -->\n# Intro\n\
                    <!-- SUGGEST_PAGE: late.md | Late | Found while writing intro -->"),
            ),
            (
                "Page path: usage.md",
                Ok("<!-- FILE: usage.md -->\n# Usage\n\
                    <!-- SUGGEST_PAGE: docs/late.md | Late | Found again -->"),
            ),
            ("Page path: api.md", Ok("<!-- FILE: api.md -->\n# API")),
            ("Page path: late.md", Ok("<!-- FILE: late.md -->\n# Late")),
        ]);
        let config = GenerationConfig { concurrency: 2, ..per_page_config() };
        let scheduler = scheduler_in(&tmp, generator.clone(), config);
        let plan = DocStructurePlan {
            files: vec![
                page("intro.md", 1, &["src/a.py"]),
                page("usage.md", 2, &["src/a.py"]),
                page("api.md", 3, &["src/b.py"]),
            ],
            rationale: String::new(),
        };

        let docs = scheduler.run_with_plan(&analysis(5_000), plan, "", "").await.expect("docs");
        assert_eq!(docs.calls, 4);
        assert_eq!(generator.prompts().len(), 4, "discovered page requested once");

        let late = generator.requested_at("Page path: late.md");
        for planned in ["Page path: intro.md", "Page path: usage.md", "Page path: api.md"] {
            assert!(
                generator.requested_at(planned) < late,
                "{planned} must precede the discovered page"
            );
        }
        assert_eq!(late, 3);
        assert_eq!(docs.plan.files.last().map(|f| f.path.as_str()), Some("late.md"));
    }

    #[tokio::test]
    async fn run_plans_before_generating() {
        let tmp = TempDir::new().expect("tmp");
        let generator = Scripted::new(vec![
            (
                "Plan the documentation structure",
                Ok(r#"{"files": [{"path": "docs/index.md", "title": "Home"}]}"#),
            ),
            ("Write the complete documentation", Ok("<!-- FILE: index.md -->\n# Home")),
        ]);
        let scheduler = scheduler_in(&tmp, generator.clone(), GenerationConfig::default());

        let outcome = scheduler.run(&analysis(100), "", "").await.expect("outcome");
        assert!(!outcome.planning.fallback);
        assert_eq!(outcome.planning.plan.file_paths(), vec!["index.md"]);
        assert_eq!(outcome.docs.files.keys().collect::<Vec<_>>(), vec!["docs/index.md"]);
        assert_eq!(generator.prompts().len(), 2);
    }
}
