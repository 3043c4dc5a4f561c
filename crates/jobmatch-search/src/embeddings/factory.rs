//! Provider factory for creating embedding providers from configuration

use std::sync::Arc;

use crate::error::{Result, SearchError};

use super::huggingface::{HuggingFaceEmbedder, HuggingFaceEmbedderConfig};
use super::openai::{OpenAIConfig, OpenAIEmbedder};
use super::provider::{EmbeddingProvider, EmbeddingProviderType};

/// Configuration for embedding providers
///
/// Specifies which provider to use and the settings for it. The settings for
/// the selected provider must be present.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingConfig {
    /// Which provider to use
    pub provider: EmbeddingProviderType,
    /// Hugging Face settings (used when provider = HuggingFace)
    pub huggingface: Option<HuggingFaceEmbedderConfig>,
    /// OpenAI provider settings (used when provider = Openai)
    pub openai: Option<OpenAIConfig>,
}

impl EmbeddingConfig {
    /// Create config for the Hugging Face provider
    pub fn huggingface(config: HuggingFaceEmbedderConfig) -> Self {
        Self {
            provider: EmbeddingProviderType::HuggingFace,
            huggingface: Some(config),
            openai: None,
        }
    }

    /// Create config for an OpenAI-compatible provider
    pub fn openai(config: OpenAIConfig) -> Self {
        Self {
            provider: EmbeddingProviderType::Openai,
            huggingface: None,
            openai: Some(config),
        }
    }
}

/// Create an embedding provider from configuration
///
/// Returns an `Arc<dyn EmbeddingProvider>` that can be shared across
/// async tasks and threads.
pub fn create(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderType::HuggingFace => {
            let settings = config.huggingface.clone().ok_or_else(|| {
                SearchError::Configuration("huggingface embedding settings missing".into())
            })?;
            Arc::new(HuggingFaceEmbedder::new(settings)?)
        }
        EmbeddingProviderType::Openai => {
            let settings = config.openai.clone().ok_or_else(|| {
                SearchError::Configuration("openai embedding settings missing".into())
            })?;
            Arc::new(OpenAIEmbedder::new(settings)?)
        }
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, EmbeddingProviderType::HuggingFace);
        assert!(config.huggingface.is_none());
    }

    #[test]
    fn test_factory_huggingface() {
        let config = EmbeddingConfig::huggingface(HuggingFaceEmbedderConfig::new("hf_key"));
        let provider = create(&config).unwrap();
        assert_eq!(provider.provider_type(), EmbeddingProviderType::HuggingFace);
        assert_eq!(provider.embedding_dim(), 384);
    }

    #[test]
    fn test_factory_openai() {
        let config = EmbeddingConfig::openai(OpenAIConfig::ollama());
        let provider = create(&config).unwrap();
        assert_eq!(provider.provider_type(), EmbeddingProviderType::Openai);
    }

    #[test]
    fn test_factory_missing_settings() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderType::Openai,
            huggingface: None,
            openai: None,
        };
        assert!(matches!(
            create(&config),
            Err(SearchError::Configuration(_))
        ));
    }
}
