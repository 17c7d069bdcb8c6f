//! Error types for the conversational engine.

use psico_core::error::PsicoError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid knowledge base: {0}")]
    InvalidKnowledgeBase(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("a reply is already pending for this session")]
    ReplyPending,
    #[error("no reply is pending for this session")]
    NoPendingReply,
    #[error("reply was cancelled before it was produced")]
    ReplyCancelled,
    #[error("scheduler error: {0}")]
    Scheduler(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<PsicoError> for ChatError {
    fn from(err: PsicoError) -> Self {
        ChatError::Config(err.to_string())
    }
}
