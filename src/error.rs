//! Error taxonomy for the documentation pipeline.
//!
//! Per-unit failures (one file, one extracted path) are recovered where they
//! occur and reported as data; the types here exist so those recoveries can be
//! logged precisely and so run-level failures reach the caller intact.

use thiserror::Error;

/// A content-source call failed. Recoverable per file.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("{0}")]
    Other(String),
}

/// A generative backend call failed.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Generation task failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// The planner's response could not be turned into a plan.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanParseError {
    #[error("No JSON found in response")]
    NoJson,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

/// A generated path was refused by the sanitizer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathRejected {
    #[error("path contains a null byte or line break")]
    ControlCharacter,

    #[error("path has no usable segments")]
    NoSegments,

    #[error("path resolves outside the output directory: {0}")]
    OutsideOutputDir(String),

    #[error("output directory cannot be resolved: {0}")]
    UnresolvableBase(String),
}

/// Failures that stop a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read repository: {0}")]
    Fetch(#[from] FetchError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
