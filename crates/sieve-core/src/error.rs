//! Error types for Sieve

use thiserror::Error;

/// The main error type for Sieve operations
///
/// Payloads are plain strings so the error can be cloned and handed to every
/// caller waiting on the same cache load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SieveError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl SieveError {
    /// Whether this error came from the remote source rather than local data
    pub fn is_remote(&self) -> bool {
        matches!(self, SieveError::NotFound(_) | SieveError::Remote(_))
    }
}

/// Result type alias for Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

impl From<std::io::Error> for SieveError {
    fn from(err: std::io::Error) -> Self {
        SieveError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        SieveError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for SieveError {
    fn from(err: toml::de::Error) -> Self {
        SieveError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = SieveError::TypeMismatch {
            expected: "time".to_string(),
            got: "string".to_string(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected time, got string");
    }

    #[test]
    fn test_is_remote() {
        assert!(SieveError::NotFound("Q1".to_string()).is_remote());
        assert!(SieveError::Remote("timeout".to_string()).is_remote());
        assert!(!SieveError::Parse("bad".to_string()).is_remote());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: SieveError = io.into();
        assert!(matches!(err, SieveError::Io(msg) if msg.contains("missing file")));
    }
}
