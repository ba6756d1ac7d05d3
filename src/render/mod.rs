//! Output rendering (LLM context, generated pages, run reports)

pub mod context;
pub mod output;
pub mod report;

pub use context::{render_compressed, render_full, render_subset, DEFAULT_PREVIEW_LINES};
pub use output::write_docs;
pub use report::write_report;
