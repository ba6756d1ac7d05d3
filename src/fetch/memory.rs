//! In-memory content source for content that was already fetched elsewhere.

use crate::domain::{RepositoryMeta, TreeEntry};
use crate::error::FetchError;
use crate::fetch::{ContentSource, TreeListing};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A single-revision repository held in memory. References are ignored.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    meta: RepositoryMeta,
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            meta: RepositoryMeta {
                full_name: name.clone(),
                name,
                default_branch: "main".to_string(),
                ..RepositoryMeta::default()
            },
            files: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.meta.language = Some(language.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn repository(&self) -> RepositoryMeta {
        self.meta.clone()
    }

    async fn fetch_tree(&self, _reference: Option<&str>) -> Result<TreeListing, FetchError> {
        let entries = self
            .files
            .iter()
            .map(|(path, content)| TreeEntry::blob(path.clone(), content.len() as u64))
            .collect();
        Ok(TreeListing { entries, truncated: false })
    }

    async fn fetch_file_content(
        &self,
        path: &str,
        _reference: Option<&str>,
    ) -> Result<String, FetchError> {
        self.files.get(path).cloned().ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
