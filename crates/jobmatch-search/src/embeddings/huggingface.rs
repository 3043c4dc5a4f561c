//! Hugging Face Inference embedding provider
//!
//! # Endpoint Format
//!
//! - POST `{base_url}/{model}/pipeline/feature-extraction`
//! - Request: `{"inputs": ["text1", "text2", ...]}`
//! - Response: `[[0.1, 0.2, ...], ...]` (one pooled vector per input)
//!
//! Sentence-transformers models return pooled sentence vectors; a single
//! input may come back as a bare vector, which is accepted as a batch of one.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{validate_batch, EmbeddingProvider, EmbeddingProviderType, ProviderStatus};
use crate::error::{Result, SearchError};
use crate::inference::{Auth, HttpSettings, InferenceClient};

/// Hugging Face Inference router base URL
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Sentence embedding model used when none is configured
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Configuration for the Hugging Face embedder
#[derive(Debug, Clone)]
pub struct HuggingFaceEmbedderConfig {
    /// Models base URL, without trailing model id
    pub base_url: String,
    /// Access token (`hf_...`)
    pub api_key: Option<String>,
    /// Model id, e.g. "sentence-transformers/all-MiniLM-L6-v2"
    pub model: String,
    /// Ask the service to block until a cold model is loaded
    pub wait_for_model: bool,
    /// Timeout and retry policy
    pub http: HttpSettings,
}

impl HuggingFaceEmbedderConfig {
    /// Config for the hosted Inference API with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: Some(api_key.into()),
            model: DEFAULT_MODEL.into(),
            wait_for_model: true,
            http: HttpSettings::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Batch(Vec<Vec<f32>>),
    Single(Vec<f32>),
}

impl FeatureExtractionResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            FeatureExtractionResponse::Batch(vectors) => vectors,
            FeatureExtractionResponse::Single(vector) => vec![vector],
        }
    }
}

/// Embedding provider backed by the Hugging Face feature-extraction pipeline
pub struct HuggingFaceEmbedder {
    client: InferenceClient,
    config: HuggingFaceEmbedderConfig,
    /// Cached embedding dimension (detected from first response)
    dimension: AtomicUsize,
}

impl HuggingFaceEmbedder {
    pub fn new(config: HuggingFaceEmbedderConfig) -> Result<Self> {
        let auth = match &config.api_key {
            Some(key) => Auth::Bearer(key.clone()),
            None => Auth::None,
        };
        let mut client =
            InferenceClient::new(&config.http, auth).map_err(SearchError::EmbeddingService)?;
        if config.wait_for_model {
            client = client.with_header("x-wait-for-model", "true");
        }

        Ok(Self {
            client,
            config,
            dimension: AtomicUsize::new(0),
        })
    }

    fn pipeline_url(&self) -> String {
        format!(
            "{}/{}/pipeline/feature-extraction",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            "Embedding {} texts with {}",
            texts.len(),
            self.config.model
        );
        let response: FeatureExtractionResponse = self
            .client
            .post_json(&self.pipeline_url(), &FeatureExtractionRequest { inputs: &texts })
            .await
            .map_err(SearchError::EmbeddingService)?;

        let embeddings = response.into_vectors();
        validate_batch(&self.dimension, texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    async fn check_status(&self) -> Result<ProviderStatus> {
        let probe = vec!["health check".to_string()];
        let provider = EmbeddingProviderType::HuggingFace.to_string();
        match self
            .client
            .probe(&self.pipeline_url(), &FeatureExtractionRequest { inputs: &probe })
            .await
        {
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
            return dim;
        }
        // Updated once a real response arrives
        match self.config.model.as_str() {
            "sentence-transformers/all-mpnet-base-v2" | "BAAI/bge-base-en-v1.5" => 768,
            "BAAI/bge-large-en-v1.5" => 1024,
            _ => 384, // MiniLM family
        }
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::HuggingFace
    }
}

impl std::fmt::Debug for HuggingFaceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceEmbedder")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("wait_for_model", &self.config.wait_for_model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str =
        "/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction";

    fn test_config(server: &MockServer) -> HuggingFaceEmbedderConfig {
        let mut config = HuggingFaceEmbedderConfig::new("hf_test");
        config.base_url = server.uri();
        config.http = HttpSettings {
            timeout_secs: 5,
            ..HttpSettings::default()
        };
        config
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("Authorization", "Bearer hf_test"))
            .and(header("x-wait-for-model", "true"))
            .and(body_json(json!({"inputs": ["first", "second"]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]])),
            )
            .mount(&server)
            .await;

        let embedder = HuggingFaceEmbedder::new(test_config(&server)).unwrap();
        let vectors = embedder
            .embed(vec!["first".into(), "second".into()])
            .await
            .unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
        assert_eq!(embedder.embedding_dim(), 3);
    }

    #[tokio::test]
    async fn test_single_vector_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([0.1, 0.2])))
            .mount(&server)
            .await;

        let embedder = HuggingFaceEmbedder::new(test_config(&server)).unwrap();
        let vectors = embedder.embed(vec!["query".into()]).await.unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2]]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let embedder = HuggingFaceEmbedder::new(test_config(&server)).unwrap();
        assert!(embedder.embed(vec![]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[0.1, 0.2]])))
            .mount(&server)
            .await;

        let embedder = HuggingFaceEmbedder::new(test_config(&server)).unwrap();
        let err = embedder
            .embed(vec!["a".into(), "b".into()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::EmbeddingService(ServiceError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_service_errors_are_embedding_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
            .mount(&server)
            .await;

        let embedder = HuggingFaceEmbedder::new(test_config(&server)).unwrap();
        let err = embedder.embed(vec!["a".into()]).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::EmbeddingService(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_check_status_reports_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
            .mount(&server)
            .await;

        let embedder = HuggingFaceEmbedder::new(test_config(&server)).unwrap();
        let status = embedder.check_status().await.unwrap();
        assert!(!status.available);
        assert!(status.error.unwrap().contains("authentication"));
    }

    #[test]
    fn test_default_dimension_guess() {
        let embedder = HuggingFaceEmbedder::new(HuggingFaceEmbedderConfig::new("hf")).unwrap();
        assert_eq!(embedder.embedding_dim(), 384);
        assert_eq!(embedder.provider_type(), EmbeddingProviderType::HuggingFace);
    }

    #[test]
    fn test_debug_omits_token() {
        let embedder = HuggingFaceEmbedder::new(HuggingFaceEmbedderConfig::new("hf_secret")).unwrap();
        assert!(!format!("{:?}", embedder).contains("hf_secret"));
    }
}
