//! Generative backend abstraction and token counting.

use crate::error::GenerationError;
use async_trait::async_trait;

pub mod backend;
pub mod tokenizer;

pub use backend::OpenAiCompatibleBackend;
pub use tokenizer::{default_counter, Cl100kCounter, HeuristicCounter, TokenCounter};

/// One call to a generative backend.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug, Default)]
pub struct GenerationResponse {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Text-in/text-out generative backend.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;

    /// Model identifier, for logs and reports.
    fn name(&self) -> &str;
}
