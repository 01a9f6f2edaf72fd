//! Prompt value object and token estimation.
//!
//! Uses a character-based heuristic: ~4 characters per token. This is
//! within ~10% for BPE tokenizers on English text, which is enough for
//! cost and latency budgeting and avoids a tokenizer dependency. Counts
//! are in `char`s, not bytes, so non-ASCII text is not over-counted.

use serde::{Deserialize, Serialize};

/// Average characters per token assumed by every budget in the system.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count for a string. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Characters that fit in `tokens` under the estimate.
pub fn chars_for_tokens(tokens: usize) -> usize {
    tokens * CHARS_PER_TOKEN
}

/// A system instruction plus one user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Estimated input tokens for both parts together.
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.system) + estimate_tokens(&self.user)
    }
}
