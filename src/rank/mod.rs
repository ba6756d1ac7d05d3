//! File ranking by importance

pub mod prioritizer;

pub use prioritizer::{prioritize, priority_tier};
