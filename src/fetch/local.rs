//! Local repository source

use crate::domain::{EntryKind, RepositoryMeta, TreeEntry};
use crate::error::FetchError;
use crate::fetch::{ContentSource, TreeListing};
use crate::utils::{decode_bytes, is_plain_relative, looks_binary, relative_slash_path};
use async_trait::async_trait;
use git2::{ErrorCode, ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Walk up from `start` looking for a `.git` directory.
///
/// Returns the first ancestor (inclusive) containing `.git`, or `start` when
/// there is none.
pub fn find_repo_root(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            if current != start {
                tracing::info!(
                    root = %current.display(),
                    from = %start.display(),
                    "Using enclosing repository root"
                );
            }
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    tracing::debug!(path = %start.display(), "No .git found; using path as repository root");
    start.to_path_buf()
}

/// A repository on local disk.
///
/// Without a reference the working tree is read (gitignore rules applied,
/// symlinks not followed). With a reference, tree and blobs come from that
/// git revision.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
    meta: RepositoryMeta,
    max_entries: Option<usize>,
}

impl LocalSource {
    pub fn open(path: &Path) -> Result<Self, FetchError> {
        let canonical = path.canonicalize().map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(FetchError::NotFound(format!("not a directory: {}", path.display())));
        }

        let root = find_repo_root(&canonical);
        let name =
            root.file_name().and_then(|n| n.to_str()).unwrap_or("repository").to_string();
        let default_branch = current_branch(&root).unwrap_or_else(|| "main".to_string());

        Ok(Self {
            meta: RepositoryMeta {
                full_name: name.clone(),
                name,
                description: None,
                language: None,
                default_branch,
            },
            root,
            max_entries: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.meta.full_name = name.clone();
        self.meta.name = name;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.meta.language = Some(language.into());
        self
    }

    /// Stop listing after `max` entries and report the listing as truncated.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn current_branch(root: &Path) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let head = repo.head().ok()?;
    head.shorthand().map(|s| s.to_string())
}

async fn run_blocking<T, F>(f: F) -> Result<T, FetchError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, FetchError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FetchError::Other(format!("blocking task failed: {e}")))?
}

#[async_trait]
impl ContentSource for LocalSource {
    fn repository(&self) -> RepositoryMeta {
        self.meta.clone()
    }

    async fn fetch_tree(&self, reference: Option<&str>) -> Result<TreeListing, FetchError> {
        let root = self.root.clone();
        let max_entries = self.max_entries;
        match reference {
            None => run_blocking(move || Ok(walk_working_tree(&root, max_entries))).await,
            Some(reference) => {
                let reference = reference.to_string();
                run_blocking(move || list_revision(&root, &reference, max_entries)).await
            }
        }
    }

    async fn fetch_file_content(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<String, FetchError> {
        if !is_plain_relative(path) {
            return Err(FetchError::NotFound(path.to_string()));
        }

        let root = self.root.clone();
        let path = path.to_string();
        let bytes = match reference {
            None => run_blocking(move || read_working_file(&root, &path)).await?,
            Some(reference) => {
                let reference = reference.to_string();
                run_blocking(move || read_revision_file(&root, &reference, &path)).await?
            }
        };

        if looks_binary(&bytes) {
            return Err(FetchError::Other("binary content".to_string()));
        }
        Ok(decode_bytes(&bytes))
    }
}

fn walk_working_tree(root: &Path, max_entries: Option<usize>) -> TreeListing {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .git_global(false)
        .require_git(false)
        .parents(false)
        .follow_links(false)
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut listing = TreeListing::default();
    for entry in builder.build().flatten() {
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let Some(rel_path) = relative_slash_path(root, entry.path()) else {
            continue;
        };

        if max_entries.is_some_and(|max| listing.entries.len() >= max) {
            listing.truncated = true;
            break;
        }

        if file_type.is_dir() {
            listing.entries.push(TreeEntry { path: rel_path, size: 0, kind: EntryKind::Tree });
        } else if file_type.is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            listing.entries.push(TreeEntry::blob(rel_path, size));
        }
    }

    listing.entries.sort_by(|a, b| a.path.cmp(&b.path));
    listing
}

fn resolve_tree<'r>(repo: &'r Repository, reference: &str) -> Result<git2::Tree<'r>, FetchError> {
    let object = repo
        .revparse_single(reference)
        .map_err(|_| FetchError::RevisionNotFound(reference.to_string()))?;
    Ok(object.peel_to_tree()?)
}

fn list_revision(
    root: &Path,
    reference: &str,
    max_entries: Option<usize>,
) -> Result<TreeListing, FetchError> {
    let repo = Repository::open(root)?;
    let tree = resolve_tree(&repo, reference)?;

    let mut listing = TreeListing::default();
    let walked = tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
        let Some(name) = entry.name() else {
            return TreeWalkResult::Skip;
        };
        if max_entries.is_some_and(|max| listing.entries.len() >= max) {
            listing.truncated = true;
            return TreeWalkResult::Abort;
        }

        let path = format!("{dir}{name}");
        match entry.kind() {
            Some(ObjectType::Tree) => {
                listing.entries.push(TreeEntry { path, size: 0, kind: EntryKind::Tree });
            }
            Some(ObjectType::Blob) => {
                let size = repo.find_blob(entry.id()).map(|b| b.size() as u64).unwrap_or(0);
                listing.entries.push(TreeEntry::blob(path, size));
            }
            // Submodule commits have no content here.
            _ => {}
        }
        TreeWalkResult::Ok
    });

    // An abort for the entry cap surfaces as an error from libgit2.
    if let Err(e) = walked {
        if !listing.truncated {
            return Err(e.into());
        }
    }

    listing.entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(listing)
}

fn read_working_file(root: &Path, path: &str) -> Result<Vec<u8>, FetchError> {
    let full_path = root.join(path);
    std::fs::read(&full_path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FetchError::NotFound(path.to_string())
        } else {
            FetchError::Io { path: path.to_string(), source }
        }
    })
}

fn read_revision_file(root: &Path, reference: &str, path: &str) -> Result<Vec<u8>, FetchError> {
    let repo = Repository::open(root)?;
    let tree = resolve_tree(&repo, reference)?;
    let entry = tree.get_path(Path::new(path)).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            FetchError::NotFound(path.to_string())
        } else {
            FetchError::Git(e)
        }
    })?;
    let blob = repo.find_blob(entry.id())?;
    Ok(blob.content().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().expect("index");
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).expect("add");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = repo.find_tree(tree_id).expect("find tree");
        let sig = git2::Signature::now("Test", "test@example.com").expect("signature");
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).expect("commit");
    }

    #[test]
    fn find_repo_root_returns_ancestor_with_git() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        fs::create_dir(root.join(".git")).expect("mkdir .git");
        let subdir = root.join("src").join("lib");
        fs::create_dir_all(&subdir).expect("mkdir subdir");

        assert_eq!(find_repo_root(&subdir), root);
    }

    #[test]
    fn find_repo_root_returns_start_when_no_git() {
        let temp = TempDir::new().expect("tmp");
        let dir = temp.path().join("myproject");
        fs::create_dir_all(&dir).expect("mkdir myproject");

        assert_eq!(find_repo_root(&dir), dir);
    }

    #[tokio::test]
    async fn working_tree_listing_respects_gitignore() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        fs::create_dir_all(root.join("src")).expect("mkdir");
        fs::write(root.join("src/main.rs"), "fn main() {}\n").expect("write");
        fs::write(root.join("secret.log"), "x").expect("write");
        fs::write(root.join(".gitignore"), "*.log\n").expect("write");

        let source = LocalSource::open(root).expect("open");
        let listing = source.fetch_tree(None).await.expect("tree");
        let paths: Vec<&str> = listing.entries.iter().map(|e| e.path.as_str()).collect();

        assert!(paths.contains(&"src"));
        assert!(paths.contains(&"src/main.rs"));
        assert!(!paths.contains(&"secret.log"));
        assert!(!listing.truncated);

        let main = listing.entries.iter().find(|e| e.path == "src/main.rs").expect("main");
        assert_eq!(main.kind, EntryKind::Blob);
        assert_eq!(main.size, 13);
    }

    #[tokio::test]
    async fn listing_cap_marks_truncation() {
        let temp = TempDir::new().expect("tmp");
        for i in 0..5 {
            fs::write(temp.path().join(format!("f{i}.md")), "x").expect("write");
        }

        let source = LocalSource::open(temp.path()).expect("open").with_max_entries(2);
        let listing = source.fetch_tree(None).await.expect("tree");
        assert_eq!(listing.entries.len(), 2);
        assert!(listing.truncated);
    }

    #[tokio::test]
    async fn content_outside_repository_is_refused() {
        let temp = TempDir::new().expect("tmp");
        let source = LocalSource::open(temp.path()).expect("open");

        let err = source.fetch_file_content("../etc/passwd", None).await.expect_err("refused");
        assert!(matches!(err, FetchError::NotFound(_)));
        let err = source.fetch_file_content("missing.md", None).await.expect_err("missing");
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn reads_content_at_a_revision() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        let repo = Repository::init(root).expect("init");
        fs::write(root.join("README.md"), "v1\n").expect("write");
        commit_all(&repo, "first");
        fs::write(root.join("README.md"), "v2\n").expect("write");
        fs::write(root.join("NEW.md"), "new\n").expect("write");

        let source = LocalSource::open(root).expect("open");

        let committed = source.fetch_file_content("README.md", Some("HEAD")).await.expect("head");
        assert_eq!(committed, "v1\n");
        let working = source.fetch_file_content("README.md", None).await.expect("working");
        assert_eq!(working, "v2\n");

        let listing = source.fetch_tree(Some("HEAD")).await.expect("tree");
        let paths: Vec<&str> = listing.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md"]);

        let err = source.fetch_tree(Some("no-such-branch")).await.expect_err("bad ref");
        assert!(matches!(err, FetchError::RevisionNotFound(_)));
    }

    #[test]
    fn metadata_overrides_apply() {
        let temp = TempDir::new().expect("tmp");
        let source = LocalSource::open(temp.path())
            .expect("open")
            .with_name("acme/widgets")
            .with_description("Widgets")
            .with_language("Rust");
        let meta = source.repository();
        assert_eq!(meta.name, "acme/widgets");
        assert_eq!(meta.description.as_deref(), Some("Widgets"));
        assert_eq!(meta.language.as_deref(), Some("Rust"));
        assert_eq!(meta.default_branch, "main");
    }
}
