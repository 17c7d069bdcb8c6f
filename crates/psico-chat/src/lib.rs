//! Rule-based conversational engine for the PsicoAdmin assistant.
//!
//! Classifies free-text utterances against a fixed knowledge base of
//! intents, picks a reply, and keeps a bounded per-session context window.

pub mod context;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod matcher;
pub mod normalize;
pub mod response;
pub mod scheduler;
pub mod session;
pub mod types;

pub use context::{ContextTracker, DEFAULT_CONTEXT_CAPACITY};
pub use engine::ChatEngine;
pub use error::ChatError;
pub use knowledge::KnowledgeBase;
pub use matcher::{Matcher, DEFAULT_PATTERN_WEIGHT};
pub use normalize::normalize;
pub use response::{RandomSource, ResponseSelector};
pub use scheduler::{ReplyScheduler, ThinkingDelay};
pub use session::{decode_utterance, ConversationSession};
pub use types::{Category, IntentEntry, MatchResult, Role, Turn};
