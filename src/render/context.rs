//! XML-style context renderings of a [`RepoAnalysis`] for backend prompts.
//!
//! - [`render_full`]: every included file in full.
//! - [`render_compressed`]: metadata, tree, and the first lines of each file
//!   annotated with its true size. Used for planning.
//! - [`render_subset`]: full content of an explicit list of paths. Used for
//!   per-page generation.

use crate::domain::{AnalyzedFile, RepoAnalysis};

pub const DEFAULT_PREVIEW_LINES: usize = 20;

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

fn push_header(parts: &mut Vec<String>, analysis: &RepoAnalysis, guidelines: &str) {
    let repo = &analysis.repository;
    parts.push(format!("<repository name=\"{}\">", escape_attr(&repo.name)));
    parts.push(format!(
        "<description>{}</description>",
        repo.description.as_deref().unwrap_or("No description")
    ));
    parts.push(format!("<language>{}</language>", repo.language.as_deref().unwrap_or("Unknown")));
    parts.push(format!("<default_branch>{}</default_branch>", repo.default_branch));
    parts.push(String::new());
    parts.push("<directory_structure>".to_string());
    parts.push(analysis.directory_structure.clone());
    parts.push("</directory_structure>".to_string());
    parts.push(String::new());

    if !guidelines.trim().is_empty() {
        parts.push("<documentation_guidelines>".to_string());
        parts.push(guidelines.to_string());
        parts.push("</documentation_guidelines>".to_string());
        parts.push(String::new());
    }
}

fn push_file(parts: &mut Vec<String>, file: &AnalyzedFile) {
    parts.push(format!("<file path=\"{}\">", escape_attr(&file.path)));
    parts.push(file.content.clone());
    parts.push("</file>".to_string());
    parts.push(String::new());
}

fn push_footer(parts: &mut Vec<String>, analysis: &RepoAnalysis) {
    if analysis.truncated {
        parts.push(String::new());
        parts.push("<note>".to_string());
        parts.push(format!(
            "Analysis was truncated. {} files were skipped due to token limits. \
             Focus on the included files for documentation.",
            analysis.skipped_files.len()
        ));
        parts.push("</note>".to_string());
    }
    parts.push("</repository>".to_string());
}

/// Every included file with its entire content.
pub fn render_full(analysis: &RepoAnalysis, guidelines: &str) -> String {
    let mut parts = Vec::new();
    push_header(&mut parts, analysis, guidelines);

    parts.push("<files>".to_string());
    for file in &analysis.files {
        push_file(&mut parts, file);
    }
    parts.push("</files>".to_string());

    push_footer(&mut parts, analysis);
    parts.join("\n")
}

/// Metadata, tree, and the first `preview_lines` lines of each file.
///
/// Each `<file>` tag carries the file's real `total_lines` and `tokens`, and
/// cut files end with `... (N more lines)`.
pub fn render_compressed(
    analysis: &RepoAnalysis,
    guidelines: &str,
    preview_lines: usize,
) -> String {
    let mut parts = Vec::new();
    push_header(&mut parts, analysis, guidelines);

    parts.push("<files>".to_string());
    for file in &analysis.files {
        let lines: Vec<&str> = file.content.lines().collect();
        parts.push(format!(
            "<file path=\"{}\" total_lines=\"{}\" tokens=\"{}\">",
            escape_attr(&file.path),
            lines.len(),
            file.token_count
        ));
        let shown = lines.len().min(preview_lines);
        parts.push(lines[..shown].join("\n"));
        if lines.len() > shown {
            parts.push(format!("... ({} more lines)", lines.len() - shown));
        }
        parts.push("</file>".to_string());
        parts.push(String::new());
    }
    parts.push("</files>".to_string());

    push_footer(&mut parts, analysis);
    parts.join("\n")
}

/// Metadata, tree, and the full content of the listed paths that exist in the
/// analysis. Unknown paths are skipped; an empty list yields no file section
/// content.
pub fn render_subset<S: AsRef<str>>(
    analysis: &RepoAnalysis,
    paths: &[S],
    guidelines: &str,
) -> String {
    let mut parts = Vec::new();
    push_header(&mut parts, analysis, guidelines);

    parts.push("<files>".to_string());
    let mut seen = std::collections::HashSet::new();
    for path in paths {
        let path = path.as_ref();
        if !seen.insert(path) {
            continue;
        }
        match analysis.file(path) {
            Some(file) => push_file(&mut parts, file),
            None => tracing::debug!(path = %path, "Requested source file not in analysis"),
        }
    }
    parts.push("</files>".to_string());

    parts.push("</repository>".to_string());
    parts.join("\n")
}
