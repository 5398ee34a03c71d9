//! Error types for bmchat

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the bookmark chat system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A vector whose length differs from the query's. Never padded or truncated.
    #[error("Dimension mismatch for {record}: expected {expected}, found {actual}")]
    DimensionMismatch {
        record: String,
        expected: usize,
        actual: usize,
    },

    #[error("Token counter error: {0}")]
    TokenCounter(String),

    #[error("Sentence splitter error: {0}")]
    SentenceSplitter(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Completion provider error: {0}")]
    CompletionProvider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// True for failures raised by the injected token counter or sentence splitter.
    pub fn is_text_analysis_failure(&self) -> bool {
        matches!(self, Error::TokenCounter(_) | Error::SentenceSplitter(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = Error::DimensionMismatch {
            record: "https://example.com#3".to_string(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for https://example.com#3: expected 3, found 2"
        );
    }

    #[test]
    fn test_text_analysis_failure_classification() {
        assert!(Error::TokenCounter("bad encoding".to_string()).is_text_analysis_failure());
        assert!(Error::SentenceSplitter("no model".to_string()).is_text_analysis_failure());
        assert!(!Error::InvalidInput("k".to_string()).is_text_analysis_failure());
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
