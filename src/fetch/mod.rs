//! Repository content sources
//!
//! The assembler only sees a [`ContentSource`]. [`LocalSource`] reads a
//! repository from disk (working tree or any git revision); [`MemorySource`]
//! serves content that is already in memory.

use crate::domain::{RepositoryMeta, TreeEntry};
use crate::error::FetchError;
use async_trait::async_trait;

pub mod local;
pub mod memory;

pub use local::{find_repo_root, LocalSource};
pub use memory::MemorySource;

/// A repository listing.
#[derive(Debug, Clone, Default)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    /// The source stopped listing early; `entries` is partial.
    pub truncated: bool,
}

/// Read access to one repository. `reference` selects a revision; `None`
/// means the source's default view.
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn repository(&self) -> RepositoryMeta;

    async fn fetch_tree(&self, reference: Option<&str>) -> Result<TreeListing, FetchError>;

    async fn fetch_file_content(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<String, FetchError>;
}
