//! Repository analysis artifacts.

use serde::Serialize;
use std::collections::BTreeMap;

/// Repository metadata reported by a content source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryMeta {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub default_branch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

/// One entry of a repository listing, as returned by `ContentSource::fetch_tree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub size: u64,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, size: u64) -> Self {
        Self { path: path.into(), size, kind: EntryKind::Blob }
    }
}

/// A listing entry that passed the file filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredFile {
    pub path: String,
    pub size: u64,
    /// Lowercased suffix including the dot, or empty for extensionless files.
    pub extension: String,
}

impl FilteredFile {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self { path, size, extension }
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Lowercased extension of the last path segment (`.rs`), or `""`.
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => name[idx..].to_lowercase(),
    }
}

/// A file whose content was fetched and kept within the token budget.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedFile {
    pub path: String,
    #[serde(skip)]
    pub content: String,
    pub size: u64,
    pub extension: String,
    pub token_count: usize,
}

/// A file that could not be fetched from the content source.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub reason: String,
}

/// Bounded, prioritized view of a repository.
///
/// `total_tokens` always equals the sum of the included files' token counts and
/// never exceeds the budget the analysis ran with. `truncated` is set exactly
/// when `skipped_files` is non-empty, i.e. when an eligible file was left out
/// for budget reasons. Fetch failures are tracked separately in `failed_files`.
#[derive(Debug, Clone, Serialize)]
pub struct RepoAnalysis {
    pub repository: RepositoryMeta,
    pub files: Vec<AnalyzedFile>,
    pub directory_structure: String,
    pub total_tokens: usize,
    pub truncated: bool,
    pub skipped_files: Vec<String>,
    pub failed_files: Vec<FailedFile>,
    /// The source reported an incomplete listing.
    pub listing_truncated: bool,
    /// Secret redactions applied, keyed by rule name.
    pub redactions: BTreeMap<String, usize>,
}

impl RepoAnalysis {
    pub fn file(&self, path: &str) -> Option<&AnalyzedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn file_paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }
}
