//! repo-docs: generate documentation for a repository with a size-limited LLM backend
//!
//! A run reads a repository through a [`fetch::ContentSource`], keeps the most
//! important files that fit a token budget ([`analysis::ContextAssembler`]),
//! asks the backend for a documentation plan ([`generate::StructurePlanner`]),
//! and generates the pages either in one call or page by page depending on
//! whether the content fits the backend's context window
//! ([`generate::GenerationScheduler`]). Every path the backend produces is
//! confined to the output directory before it is returned or written.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod llm;
pub mod pipeline;
pub mod rank;
pub mod redact;
pub mod render;
pub mod scan;
pub mod utils;

pub use error::{PipelineError, Result};
pub use pipeline::{DocPipeline, PipelineResult};
