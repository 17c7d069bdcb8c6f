pub mod config;
pub mod error;

pub use config::{AssistantConfig, DelayConfig, EngineConfig, GeneralConfig, MatchMode};
pub use error::{PsicoError, Result};
