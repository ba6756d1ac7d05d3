//! Planning, generation scheduling, and response parsing.

pub mod parser;
pub mod planner;
pub mod prompts;
pub mod sanitize;
pub mod scheduler;

pub use parser::{parse_page_suggestions, ResponseParser};
pub use planner::{default_plan, parse_structure_plan, PlanningResult, StructurePlanner};
pub use sanitize::{
    normalize_doc_path, normalize_output_dir, sanitize_path, strip_output_prefix, PathSanitizer,
};
pub use scheduler::{GenerationConfig, GenerationScheduler, ScheduleOutcome};
