//! Repository listing: eligibility filtering and tree rendering.

pub mod filter;
pub mod tree;

pub use filter::{filter_tree, FileFilter, PathPattern, DEFAULT_MAX_FILE_SIZE_BYTES};
pub use tree::build_directory_structure;
