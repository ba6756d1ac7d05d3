//! Secret redaction applied to file content before it reaches a backend

pub mod redactor;
pub mod rules;

pub use redactor::{RedactionOutcome, Redactor};
