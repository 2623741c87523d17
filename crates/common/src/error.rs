//! Error types for Niffler test tooling

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration, data helpers and verification services
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing configuration: environment variable {var} is not set")]
    MissingConfig { var: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {kind} with key {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// True for lookups that found nothing where presence was required
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_kind_and_key() {
        let err = Error::not_found("user", "alice");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: user with key alice");
    }

    #[test]
    fn test_missing_config_message() {
        let err = Error::MissingConfig {
            var: "NIFFLER_SPEND_DB_URL",
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("NIFFLER_SPEND_DB_URL"));
    }
}
