//! Target-audience inference from repository structure and docs.

use crate::domain::{AnalyzedFile, RepoAnalysis};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Libraries, APIs, SDKs, CLI tools.
    Developers,
    /// Applications and GUIs.
    EndUsers,
    Mixed,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Developers => "developers",
            Audience::EndUsers => "end_users",
            Audience::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AudienceInference {
    pub audience: Audience,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub signals: Vec<String>,
    pub tone_guidance: String,
}

const MAX_SIGNALS: usize = 5;
const DOC_FILES_SCANNED: usize = 3;

impl AudienceInference {
    fn explicit(audience: Audience, tone_guidance: &str) -> Self {
        Self {
            audience,
            confidence: 1.0,
            signals: vec!["Explicitly specified in guidelines".to_string()],
            tone_guidance: tone_guidance.to_string(),
        }
    }

    pub fn to_prompt_context(&self) -> String {
        let (heading, body) = match self.audience {
            Audience::Developers => (
                "Technical (Developers)",
                "Write documentation for developers who will integrate, extend, or build upon this project.
- Use precise technical terminology
- Include code examples and API references
- Document configuration options and parameters
- Explain architectural decisions where relevant
- Assume familiarity with programming concepts",
            ),
            Audience::EndUsers => (
                "Non-Technical (End Users)",
                "Write documentation for end users who want to use the software.
- Use clear, jargon-free language
- Focus on tasks and outcomes, not implementation
- Include step-by-step instructions
- Explain concepts before using them
- Provide troubleshooting guidance",
            ),
            Audience::Mixed => (
                "Mixed (Developers and End Users)",
                "Write documentation that serves both developers and end users.
- Start with user-friendly getting started guides
- Include separate technical reference sections
- Layer complexity: simple first, then advanced
- Clearly label sections for different audiences",
            ),
        };

        format!(
            "Target Audience: {}\nConfidence: {:.0}%\nSignals: {}\n\n{}\n\nTone: {}",
            heading,
            self.confidence * 100.0,
            self.signals.join(", "),
            body,
            self.tone_guidance
        )
    }
}

enum PathMatch {
    /// File name ends with the suffix.
    Suffix(&'static str),
    /// Path contains the directory name.
    Dir(&'static str),
    /// Exact file name.
    Name(&'static str),
}

struct PathSignal {
    matcher: PathMatch,
    label: &'static str,
    weight: f64,
}

const fn signal(matcher: PathMatch, label: &'static str, weight: f64) -> PathSignal {
    PathSignal { matcher, label, weight }
}

/// Lowercase names throughout; paths are lowercased before matching.
const DEVELOPER_PATH_SIGNALS: &[PathSignal] = &[
    signal(PathMatch::Name("pyproject.toml"), "Python package", 0.3),
    signal(PathMatch::Name("setup.py"), "Python package", 0.3),
    signal(PathMatch::Name("package.json"), "NPM package", 0.2),
    signal(PathMatch::Name("cargo.toml"), "Rust crate", 0.3),
    signal(PathMatch::Name("go.mod"), "Go module", 0.3),
    signal(PathMatch::Suffix(".gemspec"), "Ruby gem", 0.3),
    signal(PathMatch::Name("pom.xml"), "Java/Maven library", 0.3),
    signal(PathMatch::Name("build.gradle"), "Java/Gradle library", 0.2),
    signal(PathMatch::Name("cli.py"), "CLI application", 0.4),
    signal(PathMatch::Name("cli.ts"), "CLI application", 0.4),
    signal(PathMatch::Name("cli.js"), "CLI application", 0.4),
    signal(PathMatch::Name("__main__.py"), "CLI entry point", 0.3),
    signal(PathMatch::Name("openapi.yaml"), "OpenAPI spec", 0.5),
    signal(PathMatch::Name("openapi.json"), "OpenAPI spec", 0.5),
    signal(PathMatch::Name("swagger.yaml"), "Swagger spec", 0.5),
    signal(PathMatch::Name("swagger.json"), "Swagger spec", 0.5),
    signal(PathMatch::Dir("src/lib"), "Library structure", 0.3),
    signal(PathMatch::Dir("lib"), "Library structure", 0.2),
    signal(PathMatch::Dir("sdk"), "SDK structure", 0.4),
    signal(PathMatch::Dir("api"), "API structure", 0.3),
];

const END_USER_PATH_SIGNALS: &[PathSignal] = &[
    signal(PathMatch::Name("electron.js"), "Electron app", 0.4),
    signal(PathMatch::Name("electron-builder.json"), "Electron app", 0.4),
    signal(PathMatch::Name("tauri.conf.json"), "Tauri app", 0.4),
    signal(PathMatch::Suffix(".desktop"), "Desktop application", 0.3),
    signal(PathMatch::Name("info.plist"), "macOS application", 0.3),
    signal(PathMatch::Dir("pages"), "Web pages", 0.2),
    signal(PathMatch::Dir("app"), "Application structure", 0.1),
    signal(PathMatch::Dir("public"), "Public assets", 0.1),
    signal(PathMatch::Dir("static"), "Static assets", 0.1),
];

struct ContentSignal {
    pattern: Regex,
    label: &'static str,
    weight: f64,
}

fn content_signal(pattern: &str, label: &'static str, weight: f64) -> ContentSignal {
    ContentSignal { pattern: Regex::new(pattern).expect("valid regex"), label, weight }
}

static DEVELOPER_CONTENT_SIGNALS: Lazy<Vec<ContentSignal>> = Lazy::new(|| {
    vec![
        content_signal(r"(?im)^#.*\bapi\b.*reference", "API reference in docs", 0.4),
        content_signal(r"(?im)^#.*\bsdk\b", "SDK documentation", 0.4),
        content_signal(r"(?im)^#.*\blibrary\b", "Library documentation", 0.3),
        content_signal(r"(?im)^#.*\bcli\b", "CLI documentation", 0.4),
        content_signal(r"(?im)^#.*\binstallation\b.*\bpip\b", "pip installation", 0.3),
        content_signal(r"(?im)^#.*\binstallation\b.*\bnpm\b", "npm installation", 0.3),
        content_signal(r"(?im)^#.*\binstallation\b.*\bcargo\b", "cargo installation", 0.3),
        content_signal(r"(?i)\bimport\b.*\bfrom\b", "Import statements in docs", 0.2),
        content_signal(r"(?i)```(?:python|javascript|typescript|rust|go)", "Code blocks", 0.2),
        content_signal(
            r"(?i)\bexport\s+(?:default\s+)?(?:function|class|const)",
            "JS exports",
            0.2,
        ),
    ]
});

static END_USER_CONTENT_SIGNALS: Lazy<Vec<ContentSignal>> = Lazy::new(|| {
    vec![
        content_signal(r"(?im)^#.*\buser\s+guide\b", "User guide", 0.4),
        content_signal(r"(?im)^#.*\btutorial\b", "Tutorial", 0.3),
        content_signal(r"(?im)^#.*\bgetting\s+started\b", "Getting started guide", 0.2),
        content_signal(r"(?i)\bclick\b.*\bbutton\b", "UI instructions", 0.3),
        content_signal(r"(?i)\bdownload\b.*\binstaller\b", "Installer download", 0.4),
        content_signal(r"(?i)\bscreenshot\b", "Screenshots mentioned", 0.2),
    ]
});

// End-user phrases are checked first so "non-technical audience" is not read
// as a technical one.
static EXPLICIT_END_USER: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bfor\s+(?:end\s+)?users\b",
        r"\bnon-technical\s+audience\b",
        r"\buser\s+documentation\b",
        r"\bfor\s+beginners\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static EXPLICIT_DEVELOPER: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bfor\s+developers\b",
        r"\btechnical\s+audience\b",
        r"\bdeveloper\s+documentation\b",
        r"\bapi\s+documentation\b",
        r"\blibrary\s+documentation\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

const DEV_DESCRIPTION_KEYWORDS: &[&str] =
    &["library", "sdk", "api", "framework", "cli", "tool for developers"];
const USER_DESCRIPTION_KEYWORDS: &[&str] =
    &["app", "application", "desktop", "gui", "user-friendly"];

#[derive(Default)]
struct Scores {
    developer: f64,
    end_user: f64,
    signals: Vec<String>,
}

impl Scores {
    fn note(&mut self, label: &str) {
        if !self.signals.iter().any(|s| s == label) {
            self.signals.push(label.to_string());
        }
    }
}

/// Infer who the documentation is for.
///
/// An audience stated in `guidelines` wins outright. Otherwise path, doc
/// content and description signals are weighed; one side must outscore the
/// other by half again to win, else the result is mixed.
pub fn infer_audience(analysis: &RepoAnalysis, guidelines: &str) -> AudienceInference {
    if let Some(explicit) = explicit_audience(guidelines) {
        tracing::debug!(audience = explicit.audience.as_str(), "Audience stated in guidelines");
        return explicit;
    }

    let mut scores = Scores::default();
    score_paths(&analysis.files, &mut scores);
    score_doc_contents(&analysis.files, &mut scores);
    score_description(analysis.repository.description.as_deref(), &mut scores);

    let total = scores.developer + scores.end_user;
    let (audience, confidence) = if total == 0.0 {
        scores.note("Default: code repository assumed developer-focused");
        (Audience::Developers, 0.5)
    } else if scores.developer > scores.end_user * 1.5 {
        (Audience::Developers, (scores.developer / (total + 0.5)).min(0.95))
    } else if scores.end_user > scores.developer * 1.5 {
        (Audience::EndUsers, (scores.end_user / (total + 0.5)).min(0.95))
    } else {
        (Audience::Mixed, 0.6)
    };

    let tone_guidance = tone_guidance(audience, &scores.signals);
    scores.signals.truncate(MAX_SIGNALS);

    tracing::debug!(audience = audience.as_str(), confidence, "Audience inferred");

    AudienceInference { audience, confidence, signals: scores.signals, tone_guidance }
}

fn explicit_audience(guidelines: &str) -> Option<AudienceInference> {
    if guidelines.trim().is_empty() {
        return None;
    }
    let lower = guidelines.to_lowercase();

    if EXPLICIT_END_USER.iter().any(|re| re.is_match(&lower)) {
        return Some(AudienceInference::explicit(
            Audience::EndUsers,
            "Write for end users as specified in guidelines.",
        ));
    }

    let developer_stated = EXPLICIT_DEVELOPER.iter().any(|re| {
        re.find_iter(&lower).any(|m| !lower[..m.start()].ends_with("non-"))
    });
    if developer_stated {
        return Some(AudienceInference::explicit(
            Audience::Developers,
            "Write for developers as specified in guidelines.",
        ));
    }

    None
}

fn path_matches(matcher: &PathMatch, path_lower: &str, file_name: &str) -> bool {
    match matcher {
        PathMatch::Suffix(suffix) => file_name.ends_with(suffix),
        PathMatch::Dir(dir) => path_lower.contains(dir),
        PathMatch::Name(name) => file_name == *name,
    }
}

fn score_paths(files: &[AnalyzedFile], scores: &mut Scores) {
    for file in files {
        let path_lower = file.path.to_lowercase();
        let file_name = path_lower.rsplit('/').next().unwrap_or(&path_lower).to_string();

        for s in DEVELOPER_PATH_SIGNALS {
            if path_matches(&s.matcher, &path_lower, &file_name) {
                scores.developer += s.weight;
                scores.note(s.label);
            }
        }
        for s in END_USER_PATH_SIGNALS {
            if path_matches(&s.matcher, &path_lower, &file_name) {
                scores.end_user += s.weight;
                scores.note(s.label);
            }
        }
    }
}

fn score_doc_contents(files: &[AnalyzedFile], scores: &mut Scores) {
    let doc_files = files
        .iter()
        .filter(|f| {
            f.path.to_lowercase().starts_with("readme")
                || f.extension == ".md"
                || f.extension == ".rst"
        })
        .take(DOC_FILES_SCANNED);

    for file in doc_files {
        for s in DEVELOPER_CONTENT_SIGNALS.iter() {
            if s.pattern.is_match(&file.content) {
                scores.developer += s.weight;
                scores.note(s.label);
            }
        }
        for s in END_USER_CONTENT_SIGNALS.iter() {
            if s.pattern.is_match(&file.content) {
                scores.end_user += s.weight;
                scores.note(s.label);
            }
        }
    }
}

fn score_description(description: Option<&str>, scores: &mut Scores) {
    let Some(description) = description else {
        return;
    };
    let lower = description.to_lowercase();

    if let Some(keyword) = DEV_DESCRIPTION_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        scores.developer += 0.3;
        scores.signals.push(format!("Description mentions '{keyword}'"));
    }
    if let Some(keyword) = USER_DESCRIPTION_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        scores.end_user += 0.3;
        scores.signals.push(format!("Description mentions '{keyword}'"));
    }
}

fn tone_guidance(audience: Audience, signals: &[String]) -> String {
    let any = |needle: &str| signals.iter().any(|s| s.contains(needle));
    let guidance = match audience {
        Audience::Developers if any("CLI") => {
            "Focus on command-line usage, flags, and configuration options."
        }
        Audience::Developers if any("API") => {
            "Emphasize API endpoints, request/response formats, and authentication."
        }
        Audience::Developers if signals.iter().any(|s| s.to_lowercase().contains("library")) => {
            "Document public API, installation, and integration examples."
        }
        Audience::Developers => {
            "Write technical documentation with code examples and configuration details."
        }
        Audience::EndUsers if any("Desktop") || any("Electron") => {
            "Focus on installation, basic usage, and common tasks."
        }
        Audience::EndUsers => "Write user-friendly guides with clear instructions and visual aids.",
        Audience::Mixed => "Provide both quick-start guides and detailed technical reference.",
    };
    guidance.to_string()
}
