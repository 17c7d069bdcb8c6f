use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PsicoError, Result};

/// Top-level configuration for the assistant.
///
/// Loaded from `~/.psico/config.toml` by default. Every section falls back
/// to its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub delay: DelayConfig,
}

impl AssistantConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AssistantConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.engine.context_capacity == 0 {
            return Err(PsicoError::Config(
                "engine.context_capacity must be at least 1".to_string(),
            ));
        }
        if self.engine.pattern_weight == 0 {
            return Err(PsicoError::Config(
                "engine.pattern_weight must be at least 1".to_string(),
            ));
        }
        if self.delay.min_ms > self.delay.max_ms {
            return Err(PsicoError::Config(format!(
                "delay.min_ms ({}) exceeds delay.max_ms ({})",
                self.delay.min_ms, self.delay.max_ms
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// How a pattern must appear inside an utterance to count as a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring containment; "ok" also hits inside "broken".
    #[default]
    Substring,
    /// The occurrence must start and end on a word boundary.
    WordBoundary,
}

/// Intent-matching engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of most recent turns kept per session.
    pub context_capacity: usize,
    /// Score added for every pattern found in an utterance.
    pub pattern_weight: u32,
    /// Pattern matching strategy.
    pub match_mode: MatchMode,
    /// Seed for reply selection. Unset means a fresh OS seed per session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Optional TOML knowledge base replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_capacity: 10,
            pattern_weight: 10,
            match_mode: MatchMode::Substring,
            seed: None,
            knowledge_base: None,
        }
    }
}

/// Simulated "thinking" latency before a reply is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Whether replies are delayed at all.
    pub enabled: bool,
    /// Lower bound of the uniform delay, in milliseconds.
    pub min_ms: u64,
    /// Upper bound of the uniform delay, in milliseconds.
    pub max_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_ms: 300,
            max_ms: 800,
        }
    }
}
