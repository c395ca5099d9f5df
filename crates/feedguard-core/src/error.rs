//! Error types for FeedGuard

/// Result type alias using FeedGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for FeedGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing credential or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Network failure talking to a remote model
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote model call exceeded its timeout
    #[error("operation timed out")]
    Timeout,

    /// Model output did not match the expected contract
    #[error("schema error: {0}")]
    Schema(String),

    /// No usable topic could be produced for a post
    #[error("topic minting failed: {0}")]
    TopicMinting(String),

    /// Classifier construction or execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a new topic minting error
    pub fn topic_minting(msg: impl Into<String>) -> Self {
        Self::TopicMinting(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry loop should consume this error and try again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout | Self::Schema(_) | Self::Serialization(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Schema(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::transport("connection reset").is_retryable());
        assert!(Error::Timeout.is_retryable());
        assert!(Error::schema("missing boolean 'safe'").is_retryable());
        assert!(!Error::config("no api key").is_retryable());
        assert!(!Error::topic_minting("empty").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::schema("no JSON object found");
        assert_eq!(err.to_string(), "schema error: no JSON object found");
    }
}
