//! Error types for jobmatch-search

use thiserror::Error;

/// Failure talking to a remote inference service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limited by the service
    #[error("rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Model id unknown to the service
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Service unreachable, timed out, or returned a server error
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Response body did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::RateLimited { .. } | ServiceError::Unavailable(_)
        )
    }
}

/// Errors that can occur in jobmatch-search operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// Required credential or setting missing
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Embedding service call failed
    #[error("embedding service error: {0}")]
    EmbeddingService(#[source] ServiceError),

    /// Zero-shot classification call failed
    #[error("classification service error: {0}")]
    ClassificationService(#[source] ServiceError),

    /// Vector store unavailable or returned a malformed response
    #[error("vector store error: {0}")]
    Store(String),

    /// Job posting source unreadable or malformed
    #[error("corpus error: {0}")]
    Corpus(String),

    /// Embedding dimension mismatch
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<qdrant_client::QdrantError> for SearchError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        SearchError::Store(err.to_string())
    }
}

/// Result type for jobmatch-search operations
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ServiceError::Unavailable("503".into()).is_retryable());
        assert!(ServiceError::RateLimited { retry_after: None }.is_retryable());
        assert!(!ServiceError::Auth("bad token".into()).is_retryable());
        assert!(!ServiceError::ModelNotFound("x".into()).is_retryable());
        assert!(!ServiceError::InvalidResponse("x".into()).is_retryable());
    }

    #[test]
    fn test_error_display_keeps_source_detail() {
        let err = SearchError::EmbeddingService(ServiceError::Unavailable("timed out".into()));
        assert_eq!(
            err.to_string(),
            "embedding service error: service unavailable: timed out"
        );

        let err = SearchError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert!(err.to_string().contains("384"));
    }
}
