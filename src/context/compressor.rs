//! Extractive compression for compaction summaries
//!
//! Prose is reduced to its highest-frequency sentences; source code is
//! stripped of comments and blank lines (code inflates token cost well
//! beyond its information density). Both paths end with a whole-word trim
//! to a fixed token cap.

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(.*?[.!?])(?:\s+|$)").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Stateless extractive compressor
#[derive(Debug, Clone, Copy)]
pub struct ExtractiveCompressor {
    /// Number of top-scored sentences retained
    pub max_sentences: usize,
    /// Whole-word trim cap, in words (approximating tokens)
    pub max_words: usize,
}

impl Default for ExtractiveCompressor {
    fn default() -> Self {
        Self {
            max_sentences: 3,
            max_words: 120,
        }
    }
}

impl ExtractiveCompressor {
    pub fn new(max_sentences: usize, max_words: usize) -> Self {
        Self {
            max_sentences,
            max_words,
        }
    }

    fn trim(&self, text: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= self.max_words {
            return words.join(" ");
        }
        words[..self.max_words].join(" ")
    }

    fn split_sentences(text: &str) -> Vec<&str> {
        let mut sentences: Vec<&str> = SENTENCE_SPLIT
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();
        if sentences.is_empty() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
        }
        sentences
    }

    /// Summarize prose with a word-frequency heuristic: score each
    /// sentence by the summed corpus-wide frequency of its words, keep the
    /// top sentences in their original relative order.
    pub fn compress_text(&self, text: &str) -> String {
        let sentences = Self::split_sentences(text);
        if sentences.is_empty() {
            return String::new();
        }

        let mut freq: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        for sentence in &sentences {
            for m in WORD.find_iter(&sentence.to_lowercase()) {
                *freq.entry(m.as_str().to_string()).or_insert(0) += 1;
            }
        }

        let mut scored: Vec<(usize, usize, &str)> = sentences
            .iter()
            .enumerate()
            .map(|(position, sentence)| {
                let score: usize = WORD
                    .find_iter(&sentence.to_lowercase())
                    .map(|m| freq.get(m.as_str()).copied().unwrap_or(0))
                    .sum();
                (score, position, *sentence)
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        let mut kept: Vec<(usize, &str)> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(_, position, sentence)| (position, sentence))
            .collect();
        // Original relative order.
        kept.sort_by_key(|(position, _)| *position);

        let joined = kept
            .into_iter()
            .map(|(_, sentence)| sentence)
            .collect::<Vec<_>>()
            .join(" ");
        self.trim(&joined)
    }

    /// Compress source code: drop comment-only and blank lines, collapse
    /// the rest onto one line, then trim.
    pub fn compress_code(&self, code: &str) -> String {
        let lines: Vec<&str> = code
            .lines()
            .map(str::trim)
            .filter(|line| {
                !line.is_empty() && !line.starts_with('#') && !line.starts_with("//")
            })
            .collect();
        self.trim(&lines.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_text_keeps_top_sentences() {
        let text = "The cache invalidation bug happens on restart. \
                    Cache invalidation is the root cause of the bug. \
                    Weather was nice yesterday. \
                    The bug report mentions cache invalidation again.";
        let compressor = ExtractiveCompressor::default();
        let summary = compressor.compress_text(text);
        assert!(summary.contains("cache"));
        assert!(!summary.contains("Weather"));
    }

    #[test]
    fn test_compress_text_preserves_relative_order() {
        let text = "Alpha alpha alpha first. Beta beta beta second. Gamma gamma gamma third. Noise.";
        let compressor = ExtractiveCompressor::default();
        let summary = compressor.compress_text(text);
        let alpha = summary.find("Alpha").unwrap();
        let beta = summary.find("Beta").unwrap();
        let gamma = summary.find("Gamma").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn test_compress_empty_text() {
        let compressor = ExtractiveCompressor::default();
        assert_eq!(compressor.compress_text(""), "");
        assert_eq!(compressor.compress_text("   "), "");
    }

    #[test]
    fn test_trim_cuts_whole_words() {
        let compressor = ExtractiveCompressor::new(3, 5);
        let text = "one two three four five six seven.";
        let summary = compressor.compress_text(text);
        assert_eq!(summary.split_whitespace().count(), 5);
        assert_eq!(summary, "one two three four five");
    }

    #[test]
    fn test_text_without_terminators_still_summarized() {
        let compressor = ExtractiveCompressor::default();
        let summary = compressor.compress_text("no sentence punctuation here at all");
        assert_eq!(summary, "no sentence punctuation here at all");
    }

    #[test]
    fn test_compress_code_strips_comments_and_blanks() {
        let code = "# build the thing\nlet x = 1;\n\n// tmp\nlet y = x + 1;\n";
        let compressor = ExtractiveCompressor::default();
        let compressed = compressor.compress_code(code);
        assert_eq!(compressed, "let x = 1; let y = x + 1;");
    }

    #[test]
    fn test_compress_code_trims_long_output() {
        let code = (0..200)
            .map(|i| format!("let v{} = {};", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let compressor = ExtractiveCompressor::default();
        let compressed = compressor.compress_code(&code);
        assert!(compressed.split_whitespace().count() <= 120);
    }
}
