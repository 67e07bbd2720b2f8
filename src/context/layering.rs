//! Tiered, budget-constrained context assembly
//!
//! Candidates are packed in value-density order (score per token) into
//! three tiers with cumulative caps: essential (20% of the budget, high
//! scores only), relevant (up to 80%), supplemental (hard cap at 95% to
//! stay clear of provider-side truncation margins).

use crate::config::LayeringConfig;
use crate::memory::ScoredCandidate;
use std::cmp::Ordering;
use tracing::debug;

/// Assembly tier for a context fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextTier {
    Essential,
    Relevant,
    Supplemental,
}

/// Ordered tiers produced by a budget allocation pass
#[derive(Debug, Clone, Default)]
pub struct ContextLayers {
    pub essential: Vec<ScoredCandidate>,
    pub relevant: Vec<ScoredCandidate>,
    pub supplemental: Vec<ScoredCandidate>,
}

impl ContextLayers {
    pub fn is_empty(&self) -> bool {
        self.essential.is_empty() && self.relevant.is_empty() && self.supplemental.is_empty()
    }

    /// Candidates placed in one tier
    pub fn tier(&self, tier: ContextTier) -> &[ScoredCandidate] {
        match tier {
            ContextTier::Essential => &self.essential,
            ContextTier::Relevant => &self.relevant,
            ContextTier::Supplemental => &self.supplemental,
        }
    }

    /// Total token cost across all tiers
    pub fn total_tokens(&self) -> usize {
        self.iter().map(|c| c.token_cost).sum()
    }

    /// All candidates in tier order, density order within each tier
    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.essential
            .iter()
            .chain(self.relevant.iter())
            .chain(self.supplemental.iter())
    }

    /// Join fragment contents with newlines in tier order
    pub fn render(&self) -> String {
        let parts: Vec<&str> = self.iter().map(|c| c.fragment.content.as_str()).collect();
        parts.join("\n")
    }
}

/// Pack scored candidates into tiers without exceeding the token budget.
///
/// Pure function: the touch-on-read side effect for included fragments is
/// the engine's responsibility, so it happens exactly once per build.
pub fn build_layers(
    scored: &[ScoredCandidate],
    token_budget: usize,
    config: &LayeringConfig,
) -> ContextLayers {
    let mut candidates: Vec<&ScoredCandidate> = scored.iter().collect();
    candidates.sort_by(|a, b| {
        b.density()
            .partial_cmp(&a.density())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.fragment.id.cmp(&b.fragment.id))
    });

    let essential_cap = (token_budget as f64 * config.essential_fraction) as usize;
    let relevant_cap = (token_budget as f64 * config.relevant_fraction) as usize;
    let hard_cap = (token_budget as f64 * config.hard_cap_fraction) as usize;

    let mut layers = ContextLayers::default();
    let mut placed: Vec<&str> = Vec::new();
    let mut tokens_used = 0usize;

    // Pass 1: high-relevance candidates into the essential tier.
    for candidate in &candidates {
        if candidate.score < config.essential_threshold {
            continue;
        }
        if tokens_used + candidate.token_cost > essential_cap {
            continue;
        }
        layers.essential.push((*candidate).clone());
        placed.push(candidate.fragment.id.as_str());
        tokens_used += candidate.token_cost;
    }

    // Pass 2: remaining candidates while the cumulative total stays
    // within the relevant cap.
    for candidate in &candidates {
        if placed.contains(&candidate.fragment.id.as_str()) {
            continue;
        }
        if tokens_used + candidate.token_cost > relevant_cap {
            continue;
        }
        layers.relevant.push((*candidate).clone());
        placed.push(candidate.fragment.id.as_str());
        tokens_used += candidate.token_cost;
    }

    // Pass 3: fill leftover budget up to the hard cap.
    for candidate in &candidates {
        if placed.contains(&candidate.fragment.id.as_str()) {
            continue;
        }
        if tokens_used + candidate.token_cost > hard_cap {
            continue;
        }
        layers.supplemental.push((*candidate).clone());
        placed.push(candidate.fragment.id.as_str());
        tokens_used += candidate.token_cost;
    }

    // Safeguard: a non-empty corpus should yield a non-empty context,
    // unless even the single best fragment exceeds the whole budget (in
    // that degenerate case an empty context is the correct answer).
    if layers.is_empty() {
        if let Some(best) = scored.iter().max_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.fragment.id.cmp(&a.fragment.id))
        }) {
            if best.token_cost <= token_budget {
                layers.supplemental.push(best.clone());
                tokens_used += best.token_cost;
            }
        }
    }

    debug!(
        essential = layers.essential.len(),
        relevant = layers.relevant.len(),
        supplemental = layers.supplemental.len(),
        tokens_used,
        token_budget,
        "Assembled context layers"
    );

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFragment;

    fn candidate(content: &str, score: f64, token_cost: usize) -> ScoredCandidate {
        ScoredCandidate::new(MemoryFragment::new(content), score, token_cost)
    }

    #[test]
    fn test_total_stays_under_hard_cap() {
        let scored: Vec<ScoredCandidate> = (0..50)
            .map(|i| candidate(&format!("fragment {}", i), 50.0 - i as f64, 17))
            .collect();
        let layers = build_layers(&scored, 200, &LayeringConfig::default());
        assert!(!layers.is_empty());
        assert!(layers.total_tokens() <= 190); // 0.95 * 200
    }

    #[test]
    fn test_essential_tier_requires_high_score() {
        let scored = vec![
            candidate("high", 80.0, 10),
            candidate("low", 10.0, 10),
        ];
        let layers = build_layers(&scored, 1000, &LayeringConfig::default());
        assert_eq!(layers.essential.len(), 1);
        assert_eq!(layers.essential[0].fragment.content, "high");
        assert_eq!(layers.relevant.len(), 1);
    }

    #[test]
    fn test_essential_tier_cap() {
        // Each fragment scores high; only 20% of budget may land in the
        // essential tier.
        let scored: Vec<ScoredCandidate> = (0..10)
            .map(|i| candidate(&format!("e{}", i), 100.0, 30))
            .collect();
        let layers = build_layers(&scored, 1000, &LayeringConfig::default());
        let essential_tokens: usize = layers.essential.iter().map(|c| c.token_cost).sum();
        assert!(essential_tokens <= 200);

        let through_relevant: usize = essential_tokens
            + layers.relevant.iter().map(|c| c.token_cost).sum::<usize>();
        assert!(through_relevant <= 800);
    }

    #[test]
    fn test_density_ordering_prefers_cheap_high_value() {
        let scored = vec![
            candidate("dense", 30.0, 5),   // density 6.0
            candidate("bulky", 35.0, 100), // density 0.35
        ];
        let layers = build_layers(&scored, 40, &LayeringConfig::default());
        let contents: Vec<&str> = layers.iter().map(|c| c.fragment.content.as_str()).collect();
        assert_eq!(contents, vec!["dense"]);
    }

    #[test]
    fn test_non_empty_safeguard() {
        // Scores below every threshold and a token cost above the relevant
        // caps, but within the overall budget: forced into supplemental.
        let scored = vec![candidate("only one", 1.0, 98)];
        let layers = build_layers(&scored, 100, &LayeringConfig::default());
        assert_eq!(layers.supplemental.len(), 1);
    }

    #[test]
    fn test_degenerate_giant_fragment_leaves_context_empty() {
        let scored = vec![candidate("too big", 100.0, 500)];
        let layers = build_layers(&scored, 100, &LayeringConfig::default());
        assert!(layers.is_empty());
        assert_eq!(layers.render(), "");
    }

    #[test]
    fn test_zero_budget_yields_empty_layers() {
        let scored = vec![candidate("anything", 100.0, 1)];
        let layers = build_layers(&scored, 0, &LayeringConfig::default());
        assert!(layers.is_empty());
    }

    #[test]
    fn test_no_fragment_placed_twice() {
        let scored: Vec<ScoredCandidate> = (0..20)
            .map(|i| candidate(&format!("f{}", i), 60.0 - i as f64, 10))
            .collect();
        let layers = build_layers(&scored, 10_000, &LayeringConfig::default());
        let mut ids: Vec<&str> = layers.iter().map(|c| c.fragment.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_render_joins_with_newlines() {
        let scored = vec![
            candidate("first", 90.0, 5),
            candidate("second", 50.0, 5),
        ];
        let layers = build_layers(&scored, 1000, &LayeringConfig::default());
        let rendered = layers.render();
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
        assert_eq!(rendered.lines().count(), 2);
    }
}
