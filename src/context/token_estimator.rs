//! Token estimation heuristics
//!
//! Intentionally not a real tokenizer: estimates must be cheap (single
//! O(n) pass), deterministic across platforms, and good enough for budget
//! arithmetic. Roughly one token per four characters, with bonuses for
//! newlines, URLs, and punctuation-dense text.

/// Token estimator trait for different tokenization strategies
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens in the given text
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for multiple texts
    fn estimate_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.estimate(t)).collect()
    }
}

/// Character-class heuristic estimator (~85% of a real tokenizer)
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl HeuristicEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        let base = text.len() / 4;
        let mut newlines = 0usize;
        let mut punct = 0usize;
        for c in text.chars() {
            if c == '\n' {
                newlines += 1;
            } else if !c.is_ascii_alphanumeric() && !c.is_whitespace() && c != '_' {
                punct += 1;
            }
        }
        let urls = text.matches("http").count();
        // Floor of 1 keeps density ratios well-defined for tiny fragments.
        (base + newlines + urls + punct / 10).max(1)
    }
}

/// Word-based token estimator (~1.3 tokens per word)
#[derive(Debug, Clone, Copy)]
pub struct WordBasedEstimator {
    tokens_per_word: f64,
}

impl WordBasedEstimator {
    pub fn new(tokens_per_word: f64) -> Self {
        Self { tokens_per_word }
    }
}

impl Default for WordBasedEstimator {
    fn default() -> Self {
        Self::new(1.3)
    }
}

impl TokenEstimator for WordBasedEstimator {
    fn estimate(&self, text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        ((word_count as f64 * self.tokens_per_word).ceil() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_floors_at_one() {
        let estimator = HeuristicEstimator::new();
        assert_eq!(estimator.estimate(""), 1);
    }

    #[test]
    fn test_plain_text_scales_with_length() {
        let estimator = HeuristicEstimator::new();
        let short = estimator.estimate("hello world");
        let long = estimator.estimate(&"hello world ".repeat(50));
        assert!(short >= 1);
        assert!(long > short * 20);
    }

    #[test]
    fn test_newlines_add_cost() {
        let estimator = HeuristicEstimator::new();
        let flat = estimator.estimate("aaaa aaaa aaaa aaaa");
        let lined = estimator.estimate("aaaa\naaaa\naaaa\naaaa");
        assert!(lined > flat);
    }

    #[test]
    fn test_urls_add_cost() {
        let estimator = HeuristicEstimator::new();
        let with_url = estimator.estimate("see https://example.com/page for details");
        assert!(with_url >= 10);
    }

    #[test]
    fn test_deterministic() {
        let estimator = HeuristicEstimator::new();
        let text = "Mixed: code(); // comment, http://x.io\nand a second line!";
        assert_eq!(estimator.estimate(text), estimator.estimate(text));
    }

    #[test]
    fn test_word_based_estimator() {
        let estimator = WordBasedEstimator::default();
        let tokens = estimator.estimate("Hello world test");
        assert_eq!(tokens, 4); // 3 words * 1.3 = 3.9 -> 4
    }

    #[test]
    fn test_batch_estimation() {
        let estimator = HeuristicEstimator::new();
        let texts = vec!["Hello", "world", "test"];
        let tokens = estimator.estimate_batch(&texts);
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|&t| t > 0));
    }
}
