//! Documentation structure plans.

use serde::Serialize;

/// Order given to pages discovered mid-generation; sorts after every planned page.
pub const DISCOVERED_PAGE_ORDER: i64 = 999;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSection {
    pub heading: String,
    pub description: String,
    pub order: i64,
}

impl PlannedSection {
    pub fn new(heading: &str, description: &str, order: i64) -> Self {
        Self { heading: heading.to_string(), description: description.to_string(), order }
    }
}

/// One planned output page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedFile {
    pub path: String,
    pub title: String,
    pub description: String,
    pub sections: Vec<PlannedSection>,
    pub order: i64,
    /// Analyzed paths most relevant to this page. Required for per-page generation.
    pub source_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocStructurePlan {
    pub files: Vec<PlannedFile>,
    pub rationale: String,
}

impl DocStructurePlan {
    /// Pages in generation order. The sort is stable, so equal orders keep plan order.
    pub fn sorted_files(&self) -> Vec<&PlannedFile> {
        let mut files: Vec<&PlannedFile> = self.files.iter().collect();
        files.sort_by_key(|f| f.order);
        files
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.sorted_files().into_iter().map(|f| f.path.clone()).collect()
    }

    /// Render the plan as guidance for generation prompts.
    pub fn to_prompt_context(&self) -> String {
        let mut lines = vec![
            "Follow this documentation structure plan:".to_string(),
            String::new(),
        ];

        for file in self.sorted_files() {
            lines.push(format!("## {}", file.path));
            lines.push(format!("Title: {}", file.title));
            lines.push(format!("Purpose: {}", file.description));

            if !file.sections.is_empty() {
                let mut sections: Vec<&PlannedSection> = file.sections.iter().collect();
                sections.sort_by_key(|s| s.order);
                lines.push("Sections:".to_string());
                for section in sections {
                    lines.push(format!("  - {}: {}", section.heading, section.description));
                }
            }

            if !file.source_files.is_empty() {
                lines.push(format!("Source files: {}", file.source_files.join(", ")));
            }

            lines.push(String::new());
        }

        lines.join("\n")
    }
}

/// A request, embedded in a page response, to add an unplanned page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSuggestion {
    pub path: String,
    pub title: String,
    pub description: String,
    pub source_files: Vec<String>,
}

impl PageSuggestion {
    pub fn into_planned_file(self) -> PlannedFile {
        PlannedFile {
            path: self.path,
            title: self.title,
            description: self.description,
            sections: Vec::new(),
            order: DISCOVERED_PAGE_ORDER,
            source_files: self.source_files,
        }
    }
}
