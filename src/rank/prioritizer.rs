//! Deterministic importance ordering for filtered files.

use crate::domain::FilteredFile;

const ROOT_MANIFESTS: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "cargo.toml",
    "go.mod",
    "setup.py",
    "setup.cfg",
    "composer.json",
    "gemfile",
    "pubspec.yaml",
    "build.gradle",
    "pom.xml",
];

const ENTRY_POINT_STEMS: &[&str] = &["main", "index", "app", "cli"];

const ENTRY_POINT_EXTENSIONS: &[&str] =
    &[".py", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".go", ".rs", ".java", ".kt", ".rb"];

const API_MARKERS: &[&str] = &["api", "routes", "views", "handlers"];

const SOURCE_EXTENSIONS: &[&str] = &[".py", ".ts", ".js", ".go", ".rs", ".java"];
const CONFIG_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml", ".toml"];
const DOC_EXTENSIONS: &[&str] = &[".md", ".mdx", ".rst"];

/// Importance tier of a path; lower sorts first.
///
/// 0 readme, 1 root manifest, 2 entry point, 3 api/routes/views/handlers,
/// 4 source, 5 config, 6 docs, 7 everything else.
pub fn priority_tier(path: &str, extension: &str) -> u8 {
    let path_lower = path.to_lowercase();
    let name = path_lower.rsplit('/').next().unwrap_or(&path_lower);

    if name.starts_with("readme") {
        return 0;
    }

    if !path.contains('/') && ROOT_MANIFESTS.contains(&name) {
        return 1;
    }

    if let Some((stem, _)) = name.split_once('.') {
        if ENTRY_POINT_STEMS.contains(&stem) && ENTRY_POINT_EXTENSIONS.contains(&extension) {
            return 2;
        }
    }

    if API_MARKERS.iter().any(|m| path_lower.contains(m)) {
        return 3;
    }

    if SOURCE_EXTENSIONS.contains(&extension) {
        4
    } else if CONFIG_EXTENSIONS.contains(&extension) {
        5
    } else if DOC_EXTENSIONS.contains(&extension) {
        6
    } else {
        7
    }
}

/// Order files by `(tier, path)`.
pub fn prioritize(mut files: Vec<FilteredFile>) -> Vec<FilteredFile> {
    files.sort_by(|a, b| {
        priority_tier(&a.path, &a.extension)
            .cmp(&priority_tier(&b.path, &b.extension))
            .then_with(|| a.path.cmp(&b.path))
    });
    files
}
