//! Error taxonomy for fetch and traversal operations.

use std::fmt;
use thiserror::Error;

/// Boxed underlying cause kept for diagnosis
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a [`FetcherError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetcherErrorKind {
    /// Transport or HTTP failure other than rate limiting or not-found
    Network,
    /// HTTP 429 persisted after all retries; fatal to the current command
    RateLimit,
    /// Persistence failure while mapping, inserting or updating
    Database,
    /// Invalid caller arguments, raised before any request is made
    Validation,
    /// Anything else, with the original cause attached
    Unknown,
}

impl FetcherErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetcherErrorKind::Network => "NETWORK_ERROR",
            FetcherErrorKind::RateLimit => "API_RATE_LIMIT",
            FetcherErrorKind::Database => "DATABASE_ERROR",
            FetcherErrorKind::Validation => "VALIDATION_ERROR",
            FetcherErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for FetcherErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by the fetch client, the traversal engine and the fetchers
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct FetcherError {
    kind: FetcherErrorKind,
    message: String,
    #[source]
    cause: Option<Cause>,
}

/// Result type alias for fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

impl FetcherError {
    pub fn new(kind: FetcherErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetcherErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(FetcherErrorKind::RateLimit, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FetcherErrorKind::Validation, message)
    }

    /// Wrap a persistence failure
    pub fn database(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::new(FetcherErrorKind::Database, message).with_cause(cause)
    }

    /// Wrap anything that escaped classification
    pub fn unknown(cause: impl Into<Cause>) -> Self {
        let cause = cause.into();
        Self::new(FetcherErrorKind::Unknown, cause.to_string()).with_cause(cause)
    }

    pub fn kind(&self) -> FetcherErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind == FetcherErrorKind::RateLimit
    }
}

impl From<anyhow::Error> for FetcherError {
    /// Repository errors surface as `anyhow`; they are persistence failures.
    fn from(err: anyhow::Error) -> Self {
        FetcherError::database(format!("{err:#}"), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_carries_kind_tag() {
        let err = FetcherError::validation("start 10 is after end 2");
        assert_eq!(err.to_string(), "VALIDATION_ERROR: start 10 is after end 2");
        assert_eq!(err.kind(), FetcherErrorKind::Validation);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_cause_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = FetcherError::unknown(io);
        assert_eq!(err.kind(), FetcherErrorKind::Unknown);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk on fire"));
    }

    #[test]
    fn test_anyhow_converts_to_database_error() {
        let err: FetcherError = anyhow::anyhow!("UNIQUE constraint failed").into();
        assert_eq!(err.kind(), FetcherErrorKind::Database);
        assert!(err.message().contains("UNIQUE"));
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_rate_limit_flag() {
        assert!(FetcherError::rate_limit("429 after 3 retries").is_rate_limit());
        assert!(!FetcherError::network("connection reset").is_rate_limit());
    }
}
