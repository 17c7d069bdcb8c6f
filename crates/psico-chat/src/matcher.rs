//! Bag-of-patterns intent classifier.
//!
//! Every entry scores `weight` per pattern found in the normalized utterance.
//! The highest score wins; ties go to the entry declared first.

use std::sync::Arc;

use psico_core::MatchMode;
use tracing::debug;

use crate::knowledge::{CompiledPattern, KnowledgeBase};
use crate::normalize::normalize;
use crate::types::MatchResult;

/// Default score contributed by each matching pattern.
pub const DEFAULT_PATTERN_WEIGHT: u32 = 10;

/// Scores utterances against a shared knowledge base.
#[derive(Debug, Clone)]
pub struct Matcher {
    knowledge: Arc<KnowledgeBase>,
    weight: u32,
    mode: MatchMode,
}

impl Matcher {
    /// Substring matcher with the default weight.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self::with_settings(knowledge, DEFAULT_PATTERN_WEIGHT, MatchMode::Substring)
    }

    pub fn with_settings(knowledge: Arc<KnowledgeBase>, weight: u32, mode: MatchMode) -> Self {
        Self {
            knowledge,
            weight,
            mode,
        }
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    /// Classify an utterance.
    ///
    /// The best entry is only replaced on a strictly higher score, so an
    /// entry scoring zero never wins and earlier entries win ties.
    pub fn classify(&self, utterance: &str) -> MatchResult<'_> {
        let normalized = normalize(utterance);
        let mut best = MatchResult::none();

        for (entry, patterns) in self.knowledge.rules() {
            let score = self.score(&normalized, patterns);
            if score > best.score {
                best = MatchResult {
                    entry: Some(entry),
                    score,
                };
            }
        }

        debug!(
            category = best.category().map(|c| c.as_str()).unwrap_or("none"),
            score = best.score,
            "Utterance classified"
        );
        best
    }

    fn score(&self, normalized: &str, patterns: &[CompiledPattern]) -> u32 {
        let hits = patterns
            .iter()
            .filter(|p| match self.mode {
                MatchMode::Substring => normalized.contains(p.normalized.as_str()),
                MatchMode::WordBoundary => p.bounded.is_match(normalized),
            })
            .count() as u32;
        hits.saturating_mul(self.weight)
    }
}
