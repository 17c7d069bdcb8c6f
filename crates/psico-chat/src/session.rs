//! A single open conversation.
//!
//! The session is an explicit value owned by its caller: it holds its own
//! context window and random source, and shares only the read-only
//! knowledge base with other sessions.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use tracing::debug;
use uuid::Uuid;

use crate::context::ContextTracker;
use crate::error::ChatError;
use crate::matcher::Matcher;
use crate::response::{RandomSource, ResponseSelector};
use crate::types::{Category, Turn};

/// Interpret raw bytes as an utterance, rejecting anything that is not UTF-8.
pub fn decode_utterance(bytes: &[u8]) -> Result<&str, ChatError> {
    std::str::from_utf8(bytes)
        .map_err(|e| ChatError::InvalidInput(format!("utterance is not UTF-8: {}", e)))
}

/// One conversation: classify, reply, and remember the last few turns.
#[derive(Debug)]
pub struct ConversationSession<R = StdRng> {
    id: Uuid,
    started_at: DateTime<Utc>,
    message_count: u64,
    matcher: Matcher,
    selector: ResponseSelector<R>,
    context: ContextTracker,
    last_category: Option<Category>,
}

impl<R: RandomSource> ConversationSession<R> {
    /// Build a session around a matcher, drawing replies with `rng`.
    pub fn new(matcher: Matcher, context_capacity: usize, rng: R) -> Self {
        let fallback = matcher.knowledge().fallback().to_vec();
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            message_count: 0,
            matcher,
            selector: ResponseSelector::new(fallback, rng),
            context: ContextTracker::new(context_capacity),
            last_category: None,
        }
    }

    /// Produce a reply for `utterance`.
    ///
    /// Records the raw utterance, classifies it, picks a reply, records the
    /// reply, and returns it. Never fails; an empty utterance gets a
    /// fallback reply.
    pub fn respond(&mut self, utterance: &str) -> String {
        self.context.append(Turn::user(utterance));

        let result = self.matcher.classify(utterance);
        let category = result.category();
        let reply = self.selector.select(&result);

        self.context.append(Turn::bot(reply.clone()));
        self.message_count += 1;
        self.last_category = category;

        debug!(
            session_id = %self.id,
            category = category.map(|c| c.as_str()).unwrap_or("fallback"),
            score = result.score,
            turns = self.context.len(),
            "Reply produced"
        );
        reply
    }

    /// Boundary entry point for untyped input.
    ///
    /// Bytes that are not valid UTF-8 are rejected with
    /// [`ChatError::InvalidInput`] and leave the context untouched.
    pub fn respond_bytes(&mut self, bytes: &[u8]) -> Result<String, ChatError> {
        let utterance = decode_utterance(bytes)?;
        Ok(self.respond(utterance))
    }

    /// Retained turns, oldest first.
    pub fn context(&self) -> Vec<Turn> {
        self.context.snapshot()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of completed `respond` calls.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Category resolved for the most recent utterance, `None` after a fallback.
    pub fn last_category(&self) -> Option<Category> {
        self.last_category
    }
}
