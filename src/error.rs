//! Error types for skimmer.

use thiserror::Error;

/// Common error type for skimmer operations.
#[derive(Error, Debug)]
pub enum SkimmerError {
    /// Database error.
    ///
    /// Generic persistence failure; errors from sqlx are converted
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input (argument count, URL shape).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Unique-constraint conflict (user name, feed URL, follow pair).
    #[error("{0} already exists")]
    Duplicate(String),

    /// No resolvable current user.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    /// Transport failure (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Malformed feed document.
    #[error("feed parse error: {0}")]
    Parse(String),

    /// No handler registered under the command verb.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A handler failed; the underlying kind stays inspectable via `source`.
    #[error("command '{verb}' failed: {source}")]
    CommandFailed {
        verb: String,
        #[source]
        source: Box<SkimmerError>,
    },

    /// A feed row was created but the creator's follow could not be
    /// recorded. The feed is left in place.
    #[error("feed created but follow failed: {source}")]
    FeedWithoutFollow {
        #[source]
        source: Box<SkimmerError>,
    },
}

// Conversion from sqlx errors
impl From<sqlx::Error> for SkimmerError {
    fn from(e: sqlx::Error) -> Self {
        SkimmerError::Database(e.to_string())
    }
}

/// Result type alias for skimmer operations.
pub type Result<T> = std::result::Result<T, SkimmerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = SkimmerError::Validation("usage: login <name>".to_string());
        assert_eq!(err.to_string(), "validation error: usage: login <name>");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = SkimmerError::NotFound("user 'alice'".to_string());
        assert_eq!(err.to_string(), "user 'alice' not found");
    }

    #[test]
    fn test_duplicate_error_display() {
        let err = SkimmerError::Duplicate("feed 'https://example.com/rss'".to_string());
        assert_eq!(
            err.to_string(),
            "feed 'https://example.com/rss' already exists"
        );
    }

    #[test]
    fn test_unauthenticated_error_display() {
        let err = SkimmerError::Unauthenticated("no user is logged in".to_string());
        assert_eq!(
            err.to_string(),
            "authentication required: no user is logged in"
        );
    }

    #[test]
    fn test_unknown_command_display() {
        let err = SkimmerError::UnknownCommand("frobnicate".to_string());
        assert_eq!(err.to_string(), "unknown command: frobnicate");
    }

    #[test]
    fn test_command_failed_preserves_source() {
        let err = SkimmerError::CommandFailed {
            verb: "login".to_string(),
            source: Box::new(SkimmerError::NotFound("user 'bob'".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "command 'login' failed: user 'bob' not found"
        );
        match err {
            SkimmerError::CommandFailed { source, .. } => {
                assert!(matches!(*source, SkimmerError::NotFound(_)));
            }
            _ => panic!("expected CommandFailed"),
        }
    }

    #[test]
    fn test_feed_without_follow_preserves_source() {
        let err = SkimmerError::FeedWithoutFollow {
            source: Box::new(SkimmerError::Database("disk full".to_string())),
        };
        assert!(err.to_string().starts_with("feed created but follow failed"));
        match err {
            SkimmerError::FeedWithoutFollow { source } => {
                assert!(matches!(*source, SkimmerError::Database(_)));
            }
            _ => panic!("expected FeedWithoutFollow"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SkimmerError = io_err.into();
        assert!(matches!(err, SkimmerError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(SkimmerError::Network("timeout".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
