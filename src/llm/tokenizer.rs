//! Token counting.

use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Counts tokens for budget accounting.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    fn name(&self) -> &str;
}

/// BPE counter using the `cl100k_base` vocabulary.
pub struct Cl100kCounter {
    bpe: CoreBPE,
}

impl Cl100kCounter {
    pub fn new() -> anyhow::Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for Cl100kCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

/// Estimate tokens using a simple heuristic (chars / 4).
///
/// Counts Unicode code points, not bytes, so multi-byte content such as CJK
/// text is not over-counted.
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count() / 4
    }

    fn name(&self) -> &str {
        "chars/4"
    }
}

/// The BPE counter when its vocabulary loads, otherwise the heuristic.
pub fn default_counter() -> Arc<dyn TokenCounter> {
    match Cl100kCounter::new() {
        Ok(counter) => Arc::new(counter),
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to chars/4 token estimate");
            Arc::new(HeuristicCounter)
        }
    }
}
