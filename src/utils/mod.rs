//! Shared helpers

pub mod encoding;
pub mod paths;

pub use encoding::{decode_bytes, looks_binary};
pub use paths::{is_plain_relative, normalize_path, relative_slash_path};
