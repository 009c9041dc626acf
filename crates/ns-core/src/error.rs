//! Error types for NextStat

use thiserror::Error;

/// NextStat error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Validation error (bad configuration, inconsistent registry)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Selection expression could not be parsed
    #[error("Expression error: {0}")]
    Expression(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        fn open() -> Result<()> {
            std::fs::read("/definitely/not/a/real/path/ns-core")?;
            Ok(())
        }
        let err = open().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn validation_message() {
        let err = Error::Validation("unknown cut 'ptCutt'".into());
        assert_eq!(err.to_string(), "Validation error: unknown cut 'ptCutt'");
    }
}
