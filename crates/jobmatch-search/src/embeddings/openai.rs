//! Embeddings from any server speaking the OpenAI `/v1/embeddings` protocol
//!
//! Covers the hosted OpenAI API, Azure OpenAI deployments (api-key header),
//! and local servers such as Ollama. Request body is `{"model", "input"}`;
//! each returned `data` entry carries the position of its input.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{validate_batch, EmbeddingProvider, EmbeddingProviderType, ProviderStatus};
use crate::error::{Result, SearchError};
use crate::inference::{Auth, HttpSettings, InferenceClient};

/// Endpoint, model, and credentials for an OpenAI-style server
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Server root, with or without a trailing `/v1`
    pub base_url: String,
    /// Secret key; local servers usually need none
    pub api_key: Option<String>,
    /// Embedding model (e.g., "text-embedding-3-small", "nomic-embed-text")
    pub model: String,
    /// Send the key as `api-key` rather than a Bearer token
    pub azure_mode: bool,
    /// Timeout and retry policy
    pub http: HttpSettings,
}

impl OpenAIConfig {
    /// Local Ollama with `nomic-embed-text`
    pub fn ollama() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            api_key: None,
            model: "nomic-embed-text".into(),
            azure_mode: false,
            http: HttpSettings::default(),
        }
    }

    /// Hosted OpenAI with `text-embedding-3-small`
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: Some(api_key.into()),
            model: "text-embedding-3-small".into(),
            azure_mode: false,
            http: HttpSettings::default(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.http.max_retries = max_retries;
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

/// OpenAI-compatible embedding provider
pub struct OpenAIEmbedder {
    client: InferenceClient,
    config: OpenAIConfig,
    /// Dimension seen in the first successful response, 0 until then
    dimension: AtomicUsize,
}

impl OpenAIEmbedder {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let auth = match (&config.api_key, config.azure_mode) {
            (Some(key), true) => Auth::ApiKeyHeader(key.clone()),
            (Some(key), false) => Auth::Bearer(key.clone()),
            (None, _) => Auth::None,
        };
        let client =
            InferenceClient::new(&config.http, auth).map_err(SearchError::EmbeddingService)?;

        Ok(Self {
            client,
            config,
            dimension: AtomicUsize::new(0),
        })
    }

    fn embeddings_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/embeddings", base)
        } else {
            format!("{}/v1/embeddings", base)
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: &texts,
        };
        let mut response: EmbeddingsResponse = self
            .client
            .post_json(&self.embeddings_url(), &request)
            .await
            .map_err(SearchError::EmbeddingService)?;

        // Entries carry their input position; some servers do not keep order
        response.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

        validate_batch(&self.dimension, texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    async fn check_status(&self) -> Result<ProviderStatus> {
        let probe = vec!["health check".to_string()];
        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: &probe,
        };
        let provider = EmbeddingProviderType::Openai.to_string();
        match self.client.probe(&self.embeddings_url(), &request).await {
            Ok(latency) => Ok(ProviderStatus::healthy(provider, &self.config.model)
                .with_latency(latency.as_millis() as u64)),
            Err(e) => Ok(ProviderStatus::unavailable(
                provider,
                &self.config.model,
                e.to_string(),
            )),
        }
    }

    fn embedding_dim(&self) -> usize {
        let dim = self.dimension.load(Ordering::Relaxed);
        if dim > 0 {
            dim
        } else {
            // Published sizes until a response says otherwise
            match self.config.model.as_str() {
                "text-embedding-3-small" => 1536,
                "text-embedding-3-large" => 3072,
                "text-embedding-ada-002" => 1536,
                "all-minilm" => 384,
                _ => 768,
            }
        }
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Openai
    }
}

impl std::fmt::Debug for OpenAIEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIEmbedder")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("timeout_secs", &self.config.http.timeout_secs)
            .field("azure_mode", &self.config.azure_mode)
            .finish()
    }
}
