//! Confinement of generated paths to the output directory.
//!
//! Paths extracted from backend output are untrusted. They are reduced to
//! plain segments, given the `.md` extension, and finally resolved against the
//! output directory with symlinks followed; anything that does not land inside
//! it is rejected.

use crate::error::PathRejected;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DOC_EXTENSION: &str = ".md";

fn is_usable_segment(segment: &str) -> bool {
    // Covers ".", "..", dot-only names and hidden files alike.
    !segment.is_empty() && !segment.starts_with('.') && !segment.starts_with('~')
}

/// Reduce a raw path to `/`-joined usable segments ending in `.md`.
///
/// Idempotent: normalizing an already normalized path returns it unchanged.
pub fn normalize_doc_path(raw: &str) -> Result<String, PathRejected> {
    let trimmed = raw.trim();
    if trimmed.contains(['\0', '\n', '\r']) {
        return Err(PathRejected::ControlCharacter);
    }

    let segments: Vec<&str> =
        trimmed.split(['/', '\\']).filter(|segment| is_usable_segment(segment)).collect();
    if segments.is_empty() {
        return Err(PathRejected::NoSegments);
    }

    let mut joined = segments.join("/");
    if !joined.ends_with(DOC_EXTENSION) {
        joined.push_str(DOC_EXTENSION);
    }
    Ok(joined)
}

/// Canonical `/`-joined form of a configured output directory.
///
/// `./docs`, `docs/` and `docs` all become `docs`; the repository root itself
/// (`.`, `./` or empty) becomes `""`.
pub fn normalize_output_dir(output_dir: &str) -> String {
    output_dir
        .trim()
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Drop a leading `<output_dir>/` from a page path, if present.
pub fn strip_output_prefix<'a>(path: &'a str, output_dir: &str) -> &'a str {
    let dir = normalize_output_dir(output_dir);
    if dir.is_empty() {
        return path;
    }

    let mut rest = path.trim();
    while let Some(stripped) = rest.strip_prefix("./").or_else(|| rest.strip_prefix('/')) {
        rest = stripped;
    }
    rest.strip_prefix(dir.as_str())
        .and_then(|tail| tail.strip_prefix(['/', '\\']))
        .unwrap_or(path)
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
fn resolve_existing_prefix(path: &Path) -> std::io::Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut missing: Vec<OsString> = Vec::new();
    while !existing.exists() {
        let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
            break;
        };
        missing.push(name);
        if !existing.pop() {
            break;
        }
    }

    let mut resolved = if existing.as_os_str().is_empty() {
        std::env::current_dir()?.canonicalize()?
    } else {
        existing.canonicalize()?
    };
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Maps raw generated paths to `<output_dir>/<normalized>` keys, confined to
/// `root/<output_dir>` on disk.
#[derive(Debug, Clone)]
pub struct PathSanitizer {
    output_dir: String,
    base: PathBuf,
}

impl PathSanitizer {
    /// `output_dir` is taken relative to `root`, the repository being documented.
    pub fn new(root: &Path, output_dir: &str) -> Result<Self, PathRejected> {
        let output_dir = normalize_output_dir(output_dir);
        let dir = if output_dir.is_empty() { root.to_path_buf() } else { root.join(&output_dir) };
        let base = std::path::absolute(&dir)
            .and_then(|abs| resolve_existing_prefix(&abs))
            .map_err(|e| PathRejected::UnresolvableBase(format!("{}: {e}", dir.display())))?;
        Ok(Self { output_dir, base })
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    /// Resolved output directory every page must land under.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Output key for an already normalized relative path.
    pub fn output_key(&self, normalized: &str) -> String {
        if self.output_dir.is_empty() {
            normalized.to_string()
        } else {
            format!("{}/{}", self.output_dir, normalized)
        }
    }

    /// Normalize `raw` and confirm it resolves inside the output directory.
    pub fn sanitize(&self, raw: &str) -> Result<String, PathRejected> {
        let normalized = normalize_doc_path(raw)?;
        let target = resolve_existing_prefix(&self.base.join(&normalized))
            .map_err(|e| PathRejected::OutsideOutputDir(format!("{normalized}: {e}")))?;

        // Component-wise containment, not string prefix comparison.
        if target == self.base || !target.starts_with(&self.base) {
            return Err(PathRejected::OutsideOutputDir(target.display().to_string()));
        }
        Ok(self.output_key(&normalized))
    }
}

/// One-off form of [`PathSanitizer::sanitize`].
pub fn sanitize_path(raw: &str, root: &Path, output_dir: &str) -> Result<String, PathRejected> {
    PathSanitizer::new(root, output_dir)?.sanitize(raw)
}
