//! Rolling conversation context.
//!
//! Keeps the most recent turns of one session in a bounded FIFO window.
//! The log is advisory: the matcher does not read it.

use std::collections::VecDeque;

use crate::types::Turn;

/// Default number of turns retained per session.
pub const DEFAULT_CONTEXT_CAPACITY: usize = 10;

/// Bounded FIFO log of exchanged turns.
#[derive(Debug, Clone)]
pub struct ContextTracker {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_CAPACITY)
    }
}

impl ContextTracker {
    /// Tracker keeping at most `capacity` turns (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head until within capacity.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// Ordered copy of the retained turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
