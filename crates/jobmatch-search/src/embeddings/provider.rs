//! Embedding provider trait and types
//!
//! Defines the abstraction over remote embedding services:
//! - `HuggingFaceEmbedder` - Hugging Face Inference feature-extraction pipeline
//! - `OpenAIEmbedder` - OpenAI-compatible APIs (OpenAI, Azure OpenAI, Ollama)

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError, ServiceError};

/// Type of embedding provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProviderType {
    /// Hugging Face Inference API
    #[default]
    HuggingFace,
    /// OpenAI-compatible API (OpenAI, Azure OpenAI, Ollama)
    Openai,
}

impl std::fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProviderType::HuggingFace => write!(f, "huggingface"),
            EmbeddingProviderType::Openai => write!(f, "openai"),
        }
    }
}

/// Health information for a remote inference provider
///
/// Shared by embedding and classification providers.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Whether the provider is reachable and accepted the request
    pub available: bool,
    /// Provider name (e.g. "huggingface")
    pub provider: String,
    /// Model being served
    pub model: String,
    /// Last health check latency in milliseconds
    pub latency_ms: Option<u64>,
    /// Error message if provider is unavailable
    pub error: Option<String>,
}

impl ProviderStatus {
    /// Create a status for a healthy provider
    pub fn healthy(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            available: true,
            provider: provider.into(),
            model: model.into(),
            latency_ms: None,
            error: None,
        }
    }

    /// Create a status for an unavailable provider
    pub fn unavailable(
        provider: impl Into<String>,
        model: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            available: false,
            provider: provider.into(),
            model: model.into(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    /// Set latency from a health check
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Embedding provider trait
///
/// Converts text into fixed-length vectors. Implementations must be
/// `Send + Sync` so a single provider can be shared across tasks.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    ///
    /// Returns exactly one vector per input, in input order. An empty batch
    /// returns an empty result without contacting the service.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Check provider connectivity
    ///
    /// Failures are reported in the returned status rather than as errors.
    async fn check_status(&self) -> Result<ProviderStatus>;

    /// Dimensionality of generated vectors
    ///
    /// Detected from the first response; before that, a model-based guess.
    fn embedding_dim(&self) -> usize;

    /// Get the provider type identifier
    fn provider_type(&self) -> EmbeddingProviderType;
}

/// Check a provider response against its request and the cached dimension.
///
/// The first non-empty response fixes the dimension for the provider's lifetime.
pub(crate) fn validate_batch(
    dimension: &AtomicUsize,
    expected_count: usize,
    embeddings: &[Vec<f32>],
) -> Result<()> {
    if embeddings.len() != expected_count {
        return Err(SearchError::EmbeddingService(ServiceError::InvalidResponse(
            format!(
                "expected {} embeddings, got {}",
                expected_count,
                embeddings.len()
            ),
        )));
    }

    for embedding in embeddings {
        let dim = embedding.len();
        let cached = dimension.load(Ordering::Relaxed);
        if cached == 0 {
            dimension.store(dim, Ordering::Relaxed);
        } else if cached != dim {
            return Err(SearchError::DimensionMismatch {
                expected: cached,
                actual: dim,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_display() {
        assert_eq!(EmbeddingProviderType::HuggingFace.to_string(), "huggingface");
        assert_eq!(EmbeddingProviderType::Openai.to_string(), "openai");
    }

    #[test]
    fn test_provider_type_default() {
        assert_eq!(
            EmbeddingProviderType::default(),
            EmbeddingProviderType::HuggingFace
        );
    }

    #[test]
    fn test_provider_status() {
        let status = ProviderStatus::healthy("huggingface", "all-MiniLM-L6-v2").with_latency(42);
        assert!(status.available);
        assert_eq!(status.latency_ms, Some(42));
        assert!(status.error.is_none());

        let status = ProviderStatus::unavailable("openai", "text-embedding-3-small", "down");
        assert!(!status.available);
        assert_eq!(status.error.as_deref(), Some("down"));
    }

    #[test]
    fn test_validate_batch_caches_dimension() {
        let dimension = AtomicUsize::new(0);
        validate_batch(&dimension, 2, &[vec![0.0; 4], vec![1.0; 4]]).unwrap();
        assert_eq!(dimension.load(Ordering::Relaxed), 4);

        let err = validate_batch(&dimension, 1, &[vec![0.0; 8]]).unwrap_err();
        assert!(matches!(
            err,
            SearchError::DimensionMismatch {
                expected: 4,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_validate_batch_count_mismatch() {
        let dimension = AtomicUsize::new(0);
        let err = validate_batch(&dimension, 3, &[vec![0.0; 4]]).unwrap_err();
        assert!(matches!(
            err,
            SearchError::EmbeddingService(ServiceError::InvalidResponse(_))
        ));
    }
}
