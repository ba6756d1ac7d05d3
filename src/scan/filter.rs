//! Path/size eligibility filter.
//!
//! Patterns containing `/` are anchored at the repository root and matched
//! segment by segment, with `**` standing for zero or more whole segments.
//! Patterns without `/` are matched against the file name alone.

use crate::domain::{extension_of, EntryKind, FilteredFile, TreeEntry};
use globset::{GlobBuilder, GlobMatcher};
use once_cell::sync::Lazy;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git/**",
    ".svn/**",
    ".hg/**",
    // Dependencies
    "node_modules/**",
    "vendor/**",
    "venv/**",
    ".venv/**",
    "env/**",
    "__pycache__/**",
    "*.pyc",
    ".tox/**",
    ".nox/**",
    // Build output
    "dist/**",
    "build/**",
    "out/**",
    "target/**",
    "*.egg-info/**",
    // Editors and OS noise
    ".idea/**",
    ".vscode/**",
    "*.swp",
    "*.swo",
    ".DS_Store",
    "Thumbs.db",
    // Lockfiles
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Pipfile.lock",
    "poetry.lock",
    "Cargo.lock",
    // Binaries and media
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.ico",
    "*.svg",
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.eot",
    "*.mp3",
    "*.mp4",
    "*.wav",
    "*.pdf",
    "*.zip",
    "*.tar",
    "*.gz",
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    // Snapshots and fixtures
    "**/__snapshots__/**",
    "**/fixtures/**/*.json",
];

pub const TEXT_EXTENSIONS: &[&str] = &[
    // Programming languages
    ".py", ".js", ".ts", ".jsx", ".tsx", ".java", ".kt", ".scala", ".go", ".rs", ".c", ".cpp",
    ".h", ".hpp", ".cs", ".rb", ".php", ".swift", ".m", ".mm", ".r", ".jl", ".lua", ".pl", ".pm",
    ".ex", ".exs", ".erl", ".hrl", ".clj", ".cljs", ".hs", ".elm", ".f90", ".f95", ".f03", ".v",
    ".sv", ".vhd", ".zig", ".nim", ".d", ".dart", ".groovy", ".gradle",
    // Web
    ".html", ".htm", ".css", ".scss", ".sass", ".less", ".vue", ".svelte", ".astro",
    // Config
    ".json", ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".xml", ".plist", ".example",
    // Documentation
    ".md", ".mdx", ".rst", ".txt", ".adoc",
    // Shell
    ".sh", ".bash", ".zsh", ".fish", ".ps1", ".bat", ".cmd",
    // Data and schemas
    ".sql", ".graphql", ".gql", ".prisma",
    // Infrastructure
    ".dockerfile", ".containerfile", ".tf", ".hcl",
];

/// Build files recognised by exact name.
pub const EXTENSIONLESS_NAMES: &[&str] =
    &["Makefile", "Dockerfile", "Containerfile", "Justfile", "Rakefile", "Gemfile", "Brewfile"];

static DEFAULT_EXCLUDE_PATTERNS: Lazy<Vec<PathPattern>> =
    Lazy::new(|| DEFAULT_EXCLUDES.iter().filter_map(|p| PathPattern::new(p)).collect());

#[derive(Clone, Debug)]
enum Segment {
    AnyDepth,
    Glob(GlobMatcher),
}

/// A compiled path glob.
#[derive(Clone, Debug)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    basename_only: bool,
}

impl PathPattern {
    /// Compile a pattern. Returns `None` (and logs) when a segment is not a valid glob.
    pub fn new(pattern: &str) -> Option<Self> {
        let trimmed = pattern.trim().trim_start_matches("./");
        if trimmed.is_empty() {
            return None;
        }
        let basename_only = !trimmed.contains('/');

        let mut segments = Vec::new();
        for part in trimmed.split('/').filter(|p| !p.is_empty()) {
            if part == "**" {
                // Consecutive `**` are equivalent to one.
                if !matches!(segments.last(), Some(Segment::AnyDepth)) {
                    segments.push(Segment::AnyDepth);
                }
                continue;
            }
            match GlobBuilder::new(part).literal_separator(true).build() {
                Ok(glob) => segments.push(Segment::Glob(glob.compile_matcher())),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid glob pattern");
                    return None;
                }
            }
        }

        Some(Self { raw: pattern.to_string(), segments, basename_only })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if self.basename_only {
            return match parts.last() {
                Some(name) => match_segments(&self.segments, &[name]),
                None => false,
            };
        }
        match_segments(&self.segments, &parts)
    }
}

/// Recursive segment-list match. A leading `**` tries every consumption length
/// of the remaining path before matching the rest of the pattern.
fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|consumed| match_segments(rest, &path[consumed..]))
        }
        Some((Segment::Glob(matcher), rest)) => match path.split_first() {
            Some((head, tail)) => matcher.is_match(head) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Decides from a path and size alone whether a file is eligible for analysis.
#[derive(Clone, Debug)]
pub struct FileFilter {
    max_file_size_bytes: u64,
    include_patterns: Vec<PathPattern>,
    exclude_patterns: Vec<PathPattern>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileFilter {
    /// Filter with the default size limit and deny-list.
    pub fn new() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.clone(),
        }
    }

    /// Filter without the default deny-list.
    pub fn without_default_excludes() -> Self {
        Self { exclude_patterns: Vec::new(), ..Self::new() }
    }

    pub fn max_file_size_bytes(mut self, max_bytes: u64) -> Self {
        self.max_file_size_bytes = max_bytes;
        self
    }

    /// When non-empty, a path must match at least one of these.
    pub fn include_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.include_patterns =
            patterns.iter().filter_map(|p| PathPattern::new(p.as_ref())).collect();
        self
    }

    /// Additional exclusions, appended to whatever deny-list is already present.
    pub fn exclude_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.exclude_patterns.extend(patterns.iter().filter_map(|p| PathPattern::new(p.as_ref())));
        self
    }

    pub fn should_include(&self, path: &str, size: u64) -> bool {
        if size > self.max_file_size_bytes {
            return false;
        }

        if !is_known_text_file(path) {
            return false;
        }

        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| p.matches(path))
        {
            return false;
        }

        !self.exclude_patterns.iter().any(|p| p.matches(path))
    }
}

fn is_known_text_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    if EXTENSIONLESS_NAMES.contains(&name) {
        return true;
    }
    let ext = extension_of(path);
    !ext.is_empty() && TEXT_EXTENSIONS.contains(&ext.as_str())
}

/// Keep the blob entries of a listing that pass `filter`.
pub fn filter_tree(entries: &[TreeEntry], filter: &FileFilter) -> Vec<FilteredFile> {
    entries
        .iter()
        .filter(|e| e.kind == EntryKind::Blob)
        .filter(|e| filter.should_include(&e.path, e.size))
        .map(|e| FilteredFile::new(e.path.clone(), e.size))
        .collect()
}
