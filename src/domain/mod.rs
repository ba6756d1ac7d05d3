//! Core data model shared by the analysis, planning and generation stages.

mod analysis;
mod docs;
mod plan;

pub use analysis::{
    extension_of, AnalyzedFile, EntryKind, FailedFile, FilteredFile, RepoAnalysis, RepositoryMeta,
    TreeEntry,
};
pub use docs::{GeneratedDocs, GenerationStrategy, PageFailure, TokenUsage};
pub use plan::{
    DocStructurePlan, PageSuggestion, PlannedFile, PlannedSection, DISCOVERED_PAGE_ORDER,
};
