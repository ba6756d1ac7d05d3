//! End-to-end documentation runs.

use crate::analysis::{infer_audience, AudienceInference, ContextAssembler};
use crate::domain::{DocStructurePlan, GeneratedDocs, RepoAnalysis, TokenUsage};
use crate::error::Result;
use crate::fetch::ContentSource;
use crate::generate::{GenerationScheduler, PlanningResult};

/// Everything one `generate` run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub analysis: RepoAnalysis,
    pub audience: AudienceInference,
    /// The plan as returned by the planner, before any discovered pages.
    pub plan: DocStructurePlan,
    pub plan_fallback: bool,
    pub docs: GeneratedDocs,
    pub planning_usage: TokenUsage,
}

impl PipelineResult {
    /// Planning plus generation tokens.
    pub fn total_usage(&self) -> TokenUsage {
        let mut usage = self.planning_usage;
        usage.add(self.docs.total_input_tokens, self.docs.total_output_tokens);
        usage
    }
}

/// Analyze → plan → generate.
pub struct DocPipeline {
    assembler: ContextAssembler,
    scheduler: GenerationScheduler,
}

impl DocPipeline {
    pub fn new(assembler: ContextAssembler, scheduler: GenerationScheduler) -> Self {
        Self { assembler, scheduler }
    }

    pub async fn analyze(
        &self,
        source: &dyn ContentSource,
        reference: Option<&str>,
    ) -> Result<RepoAnalysis> {
        Ok(self.assembler.analyze(source, reference).await?)
    }

    /// Analyze and plan without generating pages.
    pub async fn plan(
        &self,
        source: &dyn ContentSource,
        reference: Option<&str>,
        guidelines: &str,
    ) -> Result<(RepoAnalysis, PlanningResult)> {
        let analysis = self.analyze(source, reference).await?;
        let planning = self.scheduler.planner().plan(&analysis, guidelines).await?;
        Ok((analysis, planning))
    }

    pub async fn run(
        &self,
        source: &dyn ContentSource,
        reference: Option<&str>,
        guidelines: &str,
    ) -> Result<PipelineResult> {
        let analysis = self.analyze(source, reference).await?;
        tracing::info!(
            files = analysis.files.len(),
            tokens = analysis.total_tokens,
            truncated = analysis.truncated,
            "Analyzed repository"
        );

        let audience = infer_audience(&analysis, guidelines);
        tracing::info!(
            audience = audience.audience.as_str(),
            confidence = audience.confidence,
            "Inferred audience"
        );

        let outcome = self
            .scheduler
            .run(&analysis, guidelines, &audience.to_prompt_context())
            .await?;

        tracing::info!(
            pages = outcome.docs.files.len(),
            calls = outcome.docs.calls,
            strategy = outcome.docs.strategy.as_str(),
            "Generated documentation"
        );

        Ok(PipelineResult {
            analysis,
            audience,
            plan: outcome.planning.plan,
            plan_fallback: outcome.planning.fallback,
            docs: outcome.docs,
            planning_usage: outcome.planning.usage,
        })
    }
}
