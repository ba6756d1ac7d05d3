//! Parsing of generation responses into output pages.
//!
//! Strategies are tried in order: `<!-- FILE: path -->` markers, then a JSON
//! object mapping paths to content. A strategy that admits no page counts as a
//! miss. When every strategy misses, the whole response becomes the index page.

use super::sanitize::{strip_output_prefix, PathSanitizer};
use crate::domain::PageSuggestion;
use crate::error::PathRejected;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

static FILE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*FILE:\s*([^\s>]+)\s*-->").expect("valid regex"));

static SUGGEST_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*SUGGEST_PAGE:\s*([^|>]+)\|([^|>]+)\|([^|>]+?)(?:\|([^>]*?))?\s*-->")
        .expect("valid regex")
});

static SUGGEST_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--\s*SUGGEST_PAGE:.*?-->").expect("valid regex"));

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

pub const INDEX_PAGE: &str = "index.md";

type Strategy = fn(&str, &PathSanitizer) -> Option<BTreeMap<String, String>>;

const STRATEGIES: &[(&str, Strategy)] =
    &[("file-markers", parse_file_markers), ("json", parse_json_map)];

fn admit(
    sanitizer: &PathSanitizer,
    raw_path: &str,
    pages: &mut BTreeMap<String, String>,
    content: String,
) {
    match sanitizer.sanitize(strip_output_prefix(raw_path, sanitizer.output_dir())) {
        Ok(key) => {
            pages.insert(key, content);
        }
        Err(e) => tracing::warn!(path = %raw_path, error = %e, "Dropping generated page"),
    }
}

fn strip_suggestions(content: &str) -> String {
    SUGGEST_ANY.replace_all(content, "").trim().to_string()
}

fn parse_file_markers(raw: &str, sanitizer: &PathSanitizer) -> Option<BTreeMap<String, String>> {
    let markers: Vec<_> = FILE_MARKER.captures_iter(raw).collect();
    if markers.is_empty() {
        return None;
    }

    let mut pages = BTreeMap::new();
    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        let content = strip_suggestions(&raw[whole.end()..end]);
        admit(sanitizer, path.as_str(), &mut pages, content);
    }

    (!pages.is_empty()).then_some(pages)
}

fn parse_json_map(raw: &str, sanitizer: &PathSanitizer) -> Option<BTreeMap<String, String>> {
    let candidate = JSON_OBJECT.find(raw)?;
    let object = match serde_json::from_str::<serde_json::Value>(candidate.as_str()) {
        Ok(serde_json::Value::Object(object)) => object,
        Ok(_) => return None,
        Err(e) => {
            tracing::debug!(error = %e, "Response braces are not a JSON object");
            return None;
        }
    };

    let mut pages = BTreeMap::new();
    for (path, value) in object {
        match value {
            serde_json::Value::String(content) => {
                admit(sanitizer, &path, &mut pages, strip_suggestions(&content))
            }
            other => {
                tracing::debug!(path = %path, kind = ?other, "Skipping non-string JSON value")
            }
        }
    }

    (!pages.is_empty()).then_some(pages)
}

/// Turns raw backend text into `<output_dir>/<page>.md` → content.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    sanitizer: PathSanitizer,
}

impl ResponseParser {
    /// Pages are confined to `root/<output_dir>`.
    pub fn new(root: &Path, output_dir: &str) -> Result<Self, PathRejected> {
        Ok(Self { sanitizer: PathSanitizer::new(root, output_dir)? })
    }

    pub fn sanitizer(&self) -> &PathSanitizer {
        &self.sanitizer
    }

    /// Never fails and never returns an empty map.
    pub fn parse(&self, raw: &str) -> BTreeMap<String, String> {
        for (name, strategy) in STRATEGIES {
            if let Some(pages) = strategy(raw, &self.sanitizer) {
                tracing::debug!(strategy = name, pages = pages.len(), "Parsed generation response");
                return pages;
            }
        }

        tracing::warn!("No page markers or JSON in response; writing it as the index page");
        let mut pages = BTreeMap::new();
        pages.insert(self.sanitizer.output_key(INDEX_PAGE), strip_suggestions(raw));
        pages
    }
}

/// Extract `<!-- SUGGEST_PAGE: path | title | description | src1, src2 -->` markers.
///
/// The source list is optional. Paths are returned as written; callers
/// sanitize them before scheduling.
pub fn parse_page_suggestions(raw: &str) -> Vec<PageSuggestion> {
    SUGGEST_PAGE
        .captures_iter(raw)
        .filter_map(|caps| {
            let path = caps.get(1)?.as_str().trim();
            if path.is_empty() {
                return None;
            }
            let source_files = caps
                .get(4)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(PageSuggestion {
                path: path.to_string(),
                title: caps.get(2)?.as_str().trim().to_string(),
                description: caps.get(3)?.as_str().trim().to_string(),
                source_files,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn docs_parser() -> (TempDir, ResponseParser) {
        let tmp = TempDir::new().expect("tmp");
        let parser = ResponseParser::new(tmp.path(), "docs").expect("parser");
        (tmp, parser)
    }

    #[test]
    fn file_markers_split_pages() {
        let raw = "preamble\n<!-- FILE: index.md -->\n# Home\n\nWelcome\n\
                   <!--FILE: guide/setup.md-->\n# Setup\n";
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse(raw);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages["docs/index.md"], "# Home\n\nWelcome");
        assert_eq!(pages["docs/guide/setup.md"], "# Setup");
    }

    #[test]
    fn traversal_in_marker_is_confined() {
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse("<!-- FILE: ../../etc/passwd -->\nhi");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages["docs/etc/passwd.md"], "hi");
    }

    #[test]
    fn rejected_marker_paths_are_dropped() {
        let raw = "<!-- FILE: ... -->\nbad\n<!-- FILE: ok.md -->\ngood";
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse(raw);
        assert_eq!(pages.keys().collect::<Vec<_>>(), vec!["docs/ok.md"]);
    }

    #[test]
    fn json_object_is_second_strategy() {
        let raw = "Here you go:\n```json\n\
                   {\"index.md\": \"# Home\", \"api.md\": \"# API\", \"n\": 3}\n```";
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse(raw);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages["docs/api.md"], "# API");
    }

    #[test]
    fn markers_that_all_reject_fall_through() {
        let raw = "<!-- FILE: ... -->\nnothing usable";
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse(raw);
        assert_eq!(pages.len(), 1);
        assert!(pages.contains_key("docs/index.md"));
    }

    #[test]
    fn plain_text_becomes_index() {
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse("# Just a page\n\nNo markers at all.");
        assert_eq!(pages["docs/index.md"], "# Just a page\n\nNo markers at all.");
    }

    #[test]
    fn suggestion_markers_are_parsed_and_stripped() {
        let raw = "<!-- FILE: docs/arch.md -->\n# Architecture\n\
                   <!-- SUGGEST_PAGE: docs/plugins.md | Plugins | How plugins load \
                   | src/plugins.py, src/loader.py -->\n\
                   More text";
        let (_tmp, parser) = docs_parser();
        let pages = parser.parse(raw);
        let content = &pages["docs/arch.md"];
        assert!(!content.contains("SUGGEST_PAGE"));
        assert!(content.contains("More text"));

        let suggestions = parse_page_suggestions(raw);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].path, "docs/plugins.md");
        assert_eq!(suggestions[0].title, "Plugins");
        assert_eq!(suggestions[0].description, "How plugins load");
        assert_eq!(suggestions[0].source_files, vec!["src/plugins.py", "src/loader.py"]);
    }

    #[test]
    fn suggestion_without_sources() {
        let suggestions =
            parse_page_suggestions("<!-- SUGGEST_PAGE: faq.md | FAQ | Common questions -->");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].description, "Common questions");
        assert!(suggestions[0].source_files.is_empty());

        let empty = parse_page_suggestions("<!-- SUGGEST_PAGE: faq.md | FAQ | Q |  -->");
        assert!(empty[0].source_files.is_empty());
    }

    #[test]
    fn dotted_output_dir_keeps_echoed_prefix_single() {
        let tmp = TempDir::new().expect("tmp");
        let parser = ResponseParser::new(tmp.path(), "./docs").expect("parser");

        let pages = parser.parse("<!-- FILE: docs/guide.md -->\n# Guide\n<!-- FILE: faq.md -->\nQ");
        assert_eq!(pages.keys().collect::<Vec<_>>(), vec!["docs/faq.md", "docs/guide.md"]);

        let fallback = parser.parse("no markers");
        assert!(fallback.contains_key("docs/index.md"));
    }

    #[cfg(unix)]
    #[test]
    fn containment_is_checked_under_the_repository_root() {
        let tmp = TempDir::new().expect("tmp");
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).expect("mkdir outside");
        std::fs::create_dir_all(tmp.path().join("docs")).expect("mkdir docs");
        std::os::unix::fs::symlink(&outside, tmp.path().join("docs/escape")).expect("symlink");

        let parser = ResponseParser::new(tmp.path(), "docs").expect("parser");
        let pages = parser.parse("<!-- FILE: escape/pwn.md -->\nx\n<!-- FILE: ok.md -->\ny");
        assert_eq!(pages.keys().collect::<Vec<_>>(), vec!["docs/ok.md"]);
    }
}
