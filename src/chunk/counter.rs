//! Token counting via a character-based heuristic
//!
//! Base estimate: 1 token ≈ 4 characters (English), ceiling division to
//! avoid underestimation. O(n) in text length.

/// Token counter with heuristic-based estimation
#[derive(Debug, Clone, Default)]
pub struct TokenCounter;

impl TokenCounter {
    /// Create new token counter
    pub fn new() -> Self {
        Self
    }

    /// Estimate token count for text
    pub fn estimate(&self, text: &str) -> usize {
        let char_count = text.chars().count();
        (char_count + 3) / 4
    }

    /// Batch estimate for multiple text segments
    pub fn estimate_batch(&self, texts: &[&str]) -> usize {
        texts.iter().map(|text| self.estimate(text)).sum()
    }
}
