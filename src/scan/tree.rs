//! Directory tree rendering from a flat list of repository paths.

use std::collections::BTreeMap;

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
    is_file: bool,
}

/// Render `paths` as an indented tree, directories before files and each group
/// sorted by name. Returns `(empty)` for an empty input.
pub fn build_directory_structure<S: AsRef<str>>(paths: &[S]) -> String {
    if paths.is_empty() {
        return "(empty)".to_string();
    }

    let mut root = Node::default();
    for path in paths {
        let parts: Vec<&str> = path.as_ref().split('/').filter(|p| !p.is_empty()).collect();
        let Some((file, dirs)) = parts.split_last() else {
            continue;
        };
        let mut current = &mut root;
        for dir in dirs {
            current = current.children.entry((*dir).to_string()).or_default();
        }
        current.children.entry((*file).to_string()).or_default().is_file = true;
    }

    let mut lines = Vec::new();
    walk_tree(&root, "", &mut lines);
    lines.join("\n")
}

fn walk_tree(node: &Node, prefix: &str, lines: &mut Vec<String>) {
    // A name can be both a file and a directory only in a malformed listing;
    // treat anything with children as a directory.
    let mut entries: Vec<(&String, &Node)> = node.children.iter().collect();
    entries.sort_by(|a, b| {
        let a_is_dir = !a.1.children.is_empty() || !a.1.is_file;
        let b_is_dir = !b.1.children.is_empty() || !b.1.is_file;
        b_is_dir.cmp(&a_is_dir).then_with(|| a.0.cmp(b.0))
    });

    let total_entries = entries.len();
    for (idx, (name, child)) in entries.into_iter().enumerate() {
        let is_last = idx == total_entries - 1;
        let connector = if is_last { "└── " } else { "├── " };

        if child.children.is_empty() && child.is_file {
            lines.push(format!("{}{}{}", prefix, connector, name));
        } else {
            lines.push(format!("{}{}{}/", prefix, connector, name));
            let extension = if is_last { "    " } else { "│   " };
            walk_tree(child, &format!("{}{}", prefix, extension), lines);
        }
    }
}
