//! Writing generated pages to disk.

use crate::domain::GeneratedDocs;
use crate::generate::{normalize_output_dir, strip_output_prefix, PathSanitizer};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write every page of `docs` under `root/<output_dir>`.
///
/// Each page is re-confined before anything is created and again once its
/// parent directory exists; pages that would land outside the output
/// directory, or on a symlink, are refused with a warning. Returns the paths
/// written.
pub fn write_docs(docs: &GeneratedDocs, root: &Path, output_dir: &str) -> Result<Vec<PathBuf>> {
    let base = root.join(normalize_output_dir(output_dir));
    fs::create_dir_all(&base)
        .with_context(|| format!("Failed creating output directory: {}", base.display()))?;
    let sanitizer = PathSanitizer::new(root, output_dir)?;
    let canonical_base = sanitizer.base().to_path_buf();

    let mut written = Vec::new();
    for (key, content) in &docs.files {
        let relative = strip_output_prefix(key, output_dir);
        if let Err(e) = sanitizer.sanitize(relative) {
            tracing::warn!(path = %key, error = %e, "Refusing to write page");
            continue;
        }

        let target = canonical_base.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating directory: {}", parent.display()))?;
            let resolved = parent.canonicalize()?;
            if !resolved.starts_with(&canonical_base) {
                tracing::warn!(path = %key, "Refusing to write page outside output directory");
                continue;
            }
        }
        if fs::symlink_metadata(&target).map(|m| m.file_type().is_symlink()).unwrap_or(false) {
            tracing::warn!(path = %key, "Refusing to overwrite symlink");
            continue;
        }

        let mut body = content.clone();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        fs::write(&target, body).with_context(|| format!("Failed writing {}", target.display()))?;
        tracing::debug!(path = %target.display(), "Wrote page");
        written.push(target);
    }

    Ok(written)
}
