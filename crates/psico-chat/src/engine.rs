//! Session factory.
//!
//! Owns the process-wide knowledge base and matching settings and hands out
//! independent conversation sessions.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use psico_core::{AssistantConfig, MatchMode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::context::DEFAULT_CONTEXT_CAPACITY;
use crate::error::ChatError;
use crate::knowledge::KnowledgeBase;
use crate::matcher::Matcher;
use crate::response::RandomSource;
use crate::session::ConversationSession;

/// Creates conversation sessions over a shared knowledge base.
#[derive(Debug)]
pub struct ChatEngine {
    matcher: Matcher,
    context_capacity: usize,
    seed: Option<u64>,
    sessions_created: AtomicU64,
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new(KnowledgeBase::builtin())
    }
}

impl ChatEngine {
    /// Engine with default settings over `knowledge`.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            matcher: Matcher::new(knowledge),
            context_capacity: DEFAULT_CONTEXT_CAPACITY,
            seed: None,
            sessions_created: AtomicU64::new(0),
        }
    }

    /// Build an engine from configuration.
    ///
    /// Loads `engine.knowledge_base` if set, otherwise uses the built-in one.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, ChatError> {
        config.validate()?;

        let knowledge = match config.engine.knowledge_base.as_deref() {
            Some(path) => Arc::new(KnowledgeBase::load(Path::new(path))?),
            None => KnowledgeBase::builtin(),
        };
        info!(
            intents = knowledge.len(),
            match_mode = ?config.engine.match_mode,
            context_capacity = config.engine.context_capacity,
            seeded = config.engine.seed.is_some(),
            "Chat engine ready"
        );

        Ok(Self::new(knowledge)
            .with_matching(config.engine.pattern_weight, config.engine.match_mode)
            .with_context_capacity(config.engine.context_capacity)
            .with_seed(config.engine.seed))
    }

    pub fn with_matching(mut self, weight: u32, mode: MatchMode) -> Self {
        let knowledge = Arc::clone(self.matcher.knowledge());
        self.matcher = Matcher::with_settings(knowledge, weight, mode);
        self
    }

    pub fn with_context_capacity(mut self, capacity: usize) -> Self {
        self.context_capacity = capacity;
        self
    }

    /// Seed reply selection. Session `n` (zero-based) is seeded with `seed + n`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Start a new, independent conversation.
    pub fn create_session(&self) -> ConversationSession<StdRng> {
        let n = self.sessions_created.fetch_add(1, Ordering::Relaxed);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_os_rng(),
        };
        self.create_session_with_rng(rng)
    }

    /// Start a conversation drawing replies from a caller-supplied source.
    pub fn create_session_with_rng<R: RandomSource>(&self, rng: R) -> ConversationSession<R> {
        ConversationSession::new(self.matcher.clone(), self.context_capacity, rng)
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        self.matcher.knowledge()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::io::Write;

    #[test]
    fn test_default_engine_uses_builtin() {
        let engine = ChatEngine::default();
        assert!(Arc::ptr_eq(engine.knowledge(), &KnowledgeBase::builtin()));
    }

    #[test]
    fn test_sessions_are_independent() {
        let engine = ChatEngine::default();
        let mut a = engine.create_session();
        let b = engine.create_session();
        a.respond("hola");
        assert_eq!(a.context().len(), 2);
        assert!(b.context().is_empty());
    }

    #[test]
    fn test_seeded_engines_reproduce_runs() {
        let config = {
            let mut c = AssistantConfig::default();
            c.engine.seed = Some(123);
            c
        };
        let first = ChatEngine::from_config(&config).unwrap();
        let second = ChatEngine::from_config(&config).unwrap();

        for _ in 0..3 {
            let mut a = first.create_session();
            let mut b = second.create_session();
            for utterance in ["hola", "gracias", "zzz", "chao"] {
                assert_eq!(a.respond(utterance), b.respond(utterance));
            }
        }
    }

    #[test]
    fn test_from_config_context_capacity() {
        let mut config = AssistantConfig::default();
        config.engine.context_capacity = 2;
        let engine = ChatEngine::from_config(&config).unwrap();
        let mut session = engine.create_session();
        session.respond("hola");
        session.respond("gracias");
        assert_eq!(session.context().len(), 2);
        assert_eq!(session.context()[0].text, "gracias");
    }

    #[test]
    fn test_from_config_word_boundary() {
        let mut config = AssistantConfig::default();
        config.engine.match_mode = MatchMode::WordBoundary;
        let engine = ChatEngine::from_config(&config).unwrap();
        assert!(engine.matcher().classify("ahora").entry.is_none());
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = AssistantConfig::default();
        config.delay.min_ms = 10;
        config.delay.max_ms = 1;
        let err = ChatEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn test_from_config_loads_knowledge_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            "fallback = [\"¿Perdón?\"]\n\n[[intents]]\ncategory = \"help\"\npatterns = [\"socorro\"]\nresponses = [\"Aquí estoy.\"]\n"
                .as_bytes(),
        )
        .unwrap();

        let mut config = AssistantConfig::default();
        config.engine.knowledge_base = Some(file.path().display().to_string());
        let engine = ChatEngine::from_config(&config).unwrap();

        let mut session = engine.create_session();
        assert_eq!(session.respond("¡Socorro!"), "Aquí estoy.");
        assert_eq!(session.last_category(), Some(Category::Help));
        assert_eq!(session.respond("hola"), "¿Perdón?");
    }

    #[test]
    fn test_from_config_bad_knowledge_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[[intents]]\ncategory = \"help\"\npatterns = []\nresponses = [\"x\"]\n")
            .unwrap();

        let mut config = AssistantConfig::default();
        config.engine.knowledge_base = Some(file.path().display().to_string());
        let err = ChatEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ChatError::InvalidKnowledgeBase(_)));
    }
}
