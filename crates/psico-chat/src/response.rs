//! Reply selection.
//!
//! Picks one literal reply from the winning entry, or from the knowledge
//! base's fallback pool when nothing matched. Randomness is injected so a
//! seeded source gives reproducible conversations.

use rand::Rng;

use crate::types::MatchResult;

// =============================================================================
// RandomSource
// =============================================================================

/// Source of uniform indices for reply selection.
pub trait RandomSource {
    /// A uniformly chosen index in `0..len`. `len` is never zero.
    fn next_index(&mut self, len: usize) -> usize;
}

impl<R: Rng> RandomSource for R {
    fn next_index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

// =============================================================================
// ResponseSelector
// =============================================================================

/// Chooses reply text for a classification result.
#[derive(Debug, Clone)]
pub struct ResponseSelector<R> {
    fallback: Vec<String>,
    rng: R,
}

impl<R: RandomSource> ResponseSelector<R> {
    /// `fallback` must be non-empty; [`KnowledgeBase`](crate::KnowledgeBase)
    /// guarantees this for its own pool.
    pub fn new(fallback: Vec<String>, rng: R) -> Self {
        Self { fallback, rng }
    }

    /// Pick a reply: from the matched entry if present, else from the fallback pool.
    pub fn select(&mut self, result: &MatchResult<'_>) -> String {
        let pool = match result.entry {
            Some(entry) => entry.responses.as_slice(),
            None => self.fallback.as_slice(),
        };
        let idx = self.rng.next_index(pool.len());
        pool[idx].clone()
    }

    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }
}
