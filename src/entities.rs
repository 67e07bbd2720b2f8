//! Typed entity extraction for overlap scoring
//!
//! A lexical approximation, not an NLP claim: simple regex patterns pull
//! typed values out of text so the scorer can reward fragments that mention
//! the same emails, URLs, dates, amounts, or names as the current task.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entity categories recognized by the default extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Email,
    Url,
    Phone,
    Money,
    Date,
    Person,
}

/// A typed entity with a normalized (lower-cased, trimmed) value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub value: String,
}

impl Entity {
    pub fn new(kind: EntityKind, raw: &str) -> Self {
        Self {
            kind,
            value: raw.trim().to_lowercase(),
        }
    }
}

/// Entity extraction boundary
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> HashSet<Entity>;
}

static PATTERNS: Lazy<Vec<(EntityKind, Regex)>> = Lazy::new(|| {
    vec![
        (
            EntityKind::Email,
            Regex::new(r"\b[\w.\-]+@[\w.\-]+\.\w+\b").unwrap(),
        ),
        (EntityKind::Url, Regex::new(r"https?://\S+").unwrap()),
        (
            EntityKind::Phone,
            Regex::new(r"\b\+?\d[\d\-\s]{7,}\b").unwrap(),
        ),
        (
            EntityKind::Money,
            Regex::new(r"\$\s?\d+(?:,\d{3})*(?:\.\d{2})?").unwrap(),
        ),
        (EntityKind::Date, Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap()),
        (
            EntityKind::Person,
            Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").unwrap(),
        ),
    ]
});

/// Regex-based extractor covering the common entity shapes
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl EntityExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> HashSet<Entity> {
        let mut found = HashSet::new();
        for (kind, pattern) in PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                found.insert(Entity::new(*kind, m.as_str()));
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_email_and_url() {
        let extractor = RegexExtractor::new();
        let entities = extractor.extract("Mail bob@example.com or visit https://example.com/docs");
        assert!(entities.contains(&Entity::new(EntityKind::Email, "bob@example.com")));
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Url && e.value.contains("example.com")));
    }

    #[test]
    fn test_extracts_date_money_person() {
        let extractor = RegexExtractor::new();
        let entities =
            extractor.extract("Alice Johnson paid $1,200.00 on 2024-03-15 for the server.");
        assert!(entities.contains(&Entity::new(EntityKind::Person, "Alice Johnson")));
        assert!(entities.contains(&Entity::new(EntityKind::Date, "2024-03-15")));
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Money));
    }

    #[test]
    fn test_values_are_normalized() {
        let extractor = RegexExtractor::new();
        let entities = extractor.extract("Contact Bob@Example.COM now");
        assert!(entities.contains(&Entity::new(EntityKind::Email, "bob@example.com")));
    }

    #[test]
    fn test_overlap_requires_matching_kind() {
        // The same lexical value under different kinds must not intersect.
        let a = Entity::new(EntityKind::Person, "2024-03-15");
        let b = Entity::new(EntityKind::Date, "2024-03-15");
        assert_ne!(a, b);
    }

    #[test]
    fn test_no_entities_in_plain_text() {
        let extractor = RegexExtractor::new();
        let entities = extractor.extract("just some ordinary lowercase words");
        assert!(entities.is_empty());
    }
}
