//! Error Types

use thiserror::Error;

/// Result type alias for macro analysis operations
pub type Result<T> = std::result::Result<T, MacroError>;

/// Coarse error category, used by callers to decide how to react
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the caller can fix it and retry
    Validation,

    /// Corrupt registry or unknown lookup key; fatal at startup
    Configuration,

    /// Embedding provider failed for this request only
    Retrieval,
}

/// Macro analysis error types
#[derive(Error, Debug)]
pub enum MacroError {
    /// Input rejected before any analysis ran
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown key or malformed registry
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding provider transport or protocol failure
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Embedding provider did not answer in time
    #[error("Retrieval timed out after {after_ms}ms")]
    RetrievalTimeout { after_ms: u64 },
}

impl MacroError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Retrieval(_) | Self::RetrievalTimeout { .. } => ErrorKind::Retrieval,
        }
    }

    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Retrieval)
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Invalid input: {msg}"),
            Self::Configuration(msg) => format!("The analyzer is misconfigured: {msg}"),
            Self::Retrieval(_) => "The embedding service failed. Please try again.".into(),
            Self::RetrievalTimeout { .. } => {
                "The embedding service did not respond in time. Please try again.".into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(MacroError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(MacroError::configuration("x").kind(), ErrorKind::Configuration);
        assert_eq!(MacroError::RetrievalTimeout { after_ms: 5 }.kind(), ErrorKind::Retrieval);
    }

    #[test]
    fn test_only_retrieval_is_retryable() {
        assert!(MacroError::retrieval("reset").is_retryable());
        assert!(MacroError::RetrievalTimeout { after_ms: 10 }.is_retryable());
        assert!(!MacroError::validation("empty").is_retryable());
        assert!(!MacroError::configuration("missing noise").is_retryable());
    }
}
