//! CLI argument definitions for the assistant binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use psico_core::{AssistantConfig, PsicoError};

/// PsicoAdmin assistant: a rule-based chat in your terminal.
#[derive(Parser, Debug)]
#[command(name = "psico", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Seed for reply selection, for reproducible conversations.
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u64>,

    /// Knowledge base TOML file replacing the built-in one.
    #[arg(short = 'k', long = "knowledge-base")]
    pub knowledge_base: Option<PathBuf>,

    /// Reply immediately instead of simulating thinking time.
    #[arg(long = "no-delay")]
    pub no_delay: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PSICO_CONFIG env var > ~/.psico/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PSICO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Load the configuration and apply command-line overrides.
    ///
    /// A file named by `--config` or `PSICO_CONFIG` must load and validate;
    /// only the default location falls back to defaults.
    pub fn load_config(&self) -> Result<(AssistantConfig, PathBuf), PsicoError> {
        let path = self.resolve_config_path();
        let explicit = self.config.is_some() || std::env::var_os("PSICO_CONFIG").is_some();
        let mut config = if explicit {
            AssistantConfig::load(&path)?
        } else {
            AssistantConfig::load_or_default(&path)
        };
        self.apply(&mut config);
        config.validate()?;
        Ok((config, path))
    }

    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut AssistantConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.seed.is_some() {
            config.engine.seed = self.seed;
        }
        if let Some(ref path) = self.knowledge_base {
            config.engine.knowledge_base = Some(path.to_string_lossy().to_string());
        }
        if self.no_delay {
            config.delay.enabled = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".psico").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".psico").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "psico",
            "--config",
            "/tmp/psico.toml",
            "--seed",
            "7",
            "--no-delay",
            "-l",
            "debug",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/psico.toml")));
        assert_eq!(args.seed, Some(7));
        assert!(args.no_delay);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/psico.toml"));
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs::parse_from(["psico", "--seed", "3", "--no-delay", "-k", "kb.toml"]);
        let mut config = AssistantConfig::default();
        args.apply(&mut config);
        assert_eq!(config.engine.seed, Some(3));
        assert!(!config.delay.enabled);
        assert_eq!(config.engine.knowledge_base.as_deref(), Some("kb.toml"));
        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_load_config_explicit_invalid_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[delay]\nmin_ms = 900\nmax_ms = 100").unwrap();
        let args = CliArgs::parse_from(["psico", "--config", file.path().to_str().unwrap()]);
        assert!(matches!(args.load_config(), Err(PsicoError::Config(_))));
    }

    #[test]
    fn test_load_config_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let args = CliArgs::parse_from(["psico", "--config", path.to_str().unwrap()]);
        assert!(matches!(args.load_config(), Err(PsicoError::Io(_))));
    }

    #[test]
    fn test_load_config_explicit_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nseed = 4\n\n[delay]\nmin_ms = 10\nmax_ms = 20").unwrap();
        let args = CliArgs::parse_from([
            "psico",
            "--config",
            file.path().to_str().unwrap(),
            "--no-delay",
        ]);
        let (config, path) = args.load_config().unwrap();
        assert_eq!(path, file.path());
        assert_eq!(config.engine.seed, Some(4));
        assert_eq!(config.delay.min_ms, 10);
        assert!(!config.delay.enabled);
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let args = CliArgs::parse_from(["psico"]);
        let mut config = AssistantConfig::default();
        config.engine.seed = Some(11);
        args.apply(&mut config);
        assert_eq!(config.engine.seed, Some(11));
        assert!(config.delay.enabled);
    }
}
