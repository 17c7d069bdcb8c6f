use thiserror::Error;

/// Top-level error type for the PsicoAdmin assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<PsicoError>` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PsicoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PsicoError {
    fn from(err: toml::de::Error) -> Self {
        PsicoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PsicoError {
    fn from(err: toml::ser::Error) -> Self {
        PsicoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PsicoError {
    fn from(err: serde_json::Error) -> Self {
        PsicoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, PsicoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PsicoError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = PsicoError::Serialization("bad json".to_string());
        assert_eq!(err.to_string(), "Serialization error: bad json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PsicoError = io_err.into();
        assert!(matches!(err, PsicoError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not = = valid").unwrap_err();
        let err: PsicoError = toml_err.into();
        assert!(matches!(err, PsicoError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PsicoError = json_err.into();
        assert!(matches!(err, PsicoError::Serialization(_)));
    }
}
