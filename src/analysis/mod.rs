//! Repository analysis: budgeted context assembly and audience inference.

pub mod assembler;
pub mod audience;

pub use assembler::{detect_language, ContextAssembler, DEFAULT_MAX_TOKENS};
pub use audience::{infer_audience, Audience, AudienceInference};
