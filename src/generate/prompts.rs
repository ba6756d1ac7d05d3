//! Prompt text for planning and generation calls.

use crate::domain::PlannedFile;
use std::collections::BTreeMap;

pub const PLANNING_SYSTEM_PROMPT: &str = "You are a senior technical writer. Given a repository \
overview, you design the structure of its documentation site: which pages exist, what each \
covers, and which source files each page draws on. You answer with a single JSON object and \
nothing else.";

pub const GENERATION_SYSTEM_PROMPT: &str = "You are a senior technical writer producing \
documentation pages for a software repository.

Write clear, well organized Markdown with practical examples. Keep internal helpers and test \
utilities out of user-facing pages unless the audience calls for them. Link related pages with \
relative Markdown links.

Output format:
- Start every page with a marker line `<!-- FILE: relative/path.md -->` followed by the page \
content. Paths are relative to the documentation root.
- Write nothing outside of pages.
- If a topic deserves its own page that is not in the plan, add a line \
`<!-- SUGGEST_PAGE: path.md | Title | One-line description | src/a.py, src/b.py -->` \
listing the repository files the page should be written from.";

/// Prompt for the structure planning call.
pub fn planning_prompt(compressed_context: &str) -> String {
    [
        "Plan the documentation structure for this repository.",
        "",
        compressed_context,
        "",
        "Respond with a JSON object of this shape:",
        "```json",
        "{",
        "  \"files\": [",
        "    {",
        "      \"path\": \"index.md\",",
        "      \"title\": \"Overview\",",
        "      \"description\": \"What the project is and who it is for\",",
        "      \"order\": 1,",
        "      \"sections\": [",
        "        {\"heading\": \"Introduction\", \"description\": \"Purpose and scope\", \"order\": 1}",
        "      ],",
        "      \"sourceFiles\": [\"README.md\", \"src/main.py\"]",
        "    }",
        "  ],",
        "  \"rationale\": \"Why this structure suits the project\"",
        "}",
        "```",
        "",
        "Requirements:",
        "- Start with index.md as the overview page",
        "- Give each major feature or subsystem its own page",
        "- Paths are relative to the documentation root and end in .md",
        "- sourceFiles must name files from the repository listing above",
        "- Output ONLY the JSON object",
    ]
    .join("\n")
}

/// Prompt for generating every page in one call.
pub fn single_shot_prompt(
    full_context: &str,
    plan_context: &str,
    audience_context: &str,
) -> String {
    let mut parts = vec![
        "Write the complete documentation for this repository.".to_string(),
        String::new(),
        full_context.to_string(),
        String::new(),
        plan_context.to_string(),
    ];
    if !audience_context.is_empty() {
        parts.push(String::new());
        parts.push(audience_context.to_string());
    }
    parts.push(String::new());
    parts.push("Produce every planned page, each introduced by its FILE marker.".to_string());
    parts.join("\n")
}

/// Prompt for generating one planned page.
///
/// `written` maps already generated page paths to their titles so the page can
/// link to them.
pub fn page_prompt(
    subset_context: &str,
    page: &PlannedFile,
    plan_context: &str,
    audience_context: &str,
    written: &BTreeMap<String, String>,
) -> String {
    let mut parts = vec![
        format!("Write the documentation page `{}`.", page.path),
        String::new(),
        subset_context.to_string(),
        String::new(),
        "<page>".to_string(),
        format!("Page path: {}", page.path),
        format!("Title: {}", page.title),
        format!("Purpose: {}", page.description),
    ];

    let mut sections: Vec<_> = page.sections.iter().collect();
    sections.sort_by_key(|s| s.order);
    if !sections.is_empty() {
        parts.push("Sections:".to_string());
        for section in sections {
            parts.push(format!("  - {}: {}", section.heading, section.description));
        }
    }
    parts.push("</page>".to_string());

    parts.push(String::new());
    parts.push(plan_context.to_string());

    if !audience_context.is_empty() {
        parts.push(String::new());
        parts.push(audience_context.to_string());
    }

    if !written.is_empty() {
        parts.push(String::new());
        parts.push("Pages already written (link to them where relevant):".to_string());
        for (path, title) in written {
            parts.push(format!("- {path}: {title}"));
        }
    }

    parts.push(String::new());
    parts.push(format!(
        "Output only this page, starting with `<!-- FILE: {} -->`. Suggest extra pages with \
         SUGGEST_PAGE markers if the source files warrant them.",
        page.path
    ));
    parts.join("\n")
}
