//! Core value types shared by the assistant engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Turn
// =============================================================================

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Bot => f.write_str("bot"),
        }
    }
}

/// One exchanged message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// A user turn stamped with the current instant.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// A bot turn stamped with the current instant.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Intent entries
// =============================================================================

/// Topic an intent entry answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Greeting,
    Appointment,
    Payment,
    Documents,
    Professionals,
    History,
    Profile,
    Help,
    Farewell,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::Appointment => "appointment",
            Category::Payment => "payment",
            Category::Documents => "documents",
            Category::Professionals => "professionals",
            Category::History => "history",
            Category::Profile => "profile",
            Category::Help => "help",
            Category::Farewell => "farewell",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule binding trigger phrases to a pool of replies.
///
/// Validated by [`KnowledgeBase::new`](crate::knowledge::KnowledgeBase::new):
/// at least one pattern, at least one response, no blank or duplicate patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEntry {
    pub category: Category,
    pub patterns: Vec<String>,
    pub responses: Vec<String>,
}

impl IntentEntry {
    pub fn new<P, R>(category: Category, patterns: P, responses: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            category,
            patterns: patterns.into_iter().map(Into::into).collect(),
            responses: responses.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// MatchResult
// =============================================================================

/// Outcome of classifying one utterance. Transient, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult<'kb> {
    /// Winning entry, absent when nothing scored above zero.
    pub entry: Option<&'kb IntentEntry>,
    /// Score of the winning entry, zero when absent.
    pub score: u32,
}

impl<'kb> MatchResult<'kb> {
    pub fn none() -> Self {
        Self {
            entry: None,
            score: 0,
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.entry.map(|e| e.category)
    }
}
