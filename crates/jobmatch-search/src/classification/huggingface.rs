//! Hugging Face Inference zero-shot classification provider
//!
//! # Endpoint Format
//!
//! - POST `{base_url}/{model}/pipeline/zero-shot-classification`
//! - Request: `{"inputs": "text", "parameters": {"candidate_labels": ["a", "b"]}}`
//! - Response: `[{"label": "a", "score": 0.9}, ...]`, or the older
//!   `{"sequence": "text", "labels": ["a", ...], "scores": [0.9, ...]}`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{sort_descending, ClassificationProvider, LabelScore};
use crate::embeddings::ProviderStatus;
use crate::error::{Result, SearchError, ServiceError};
use crate::inference::{Auth, HttpSettings, InferenceClient};

pub use crate::embeddings::huggingface::DEFAULT_BASE_URL;

/// NLI model used for zero-shot classification when none is configured
pub const DEFAULT_MODEL: &str = "facebook/bart-large-mnli";

/// Configuration for the Hugging Face classifier
#[derive(Debug, Clone)]
pub struct HuggingFaceClassifierConfig {
    /// Models base URL, without trailing model id
    pub base_url: String,
    /// Access token (`hf_...`)
    pub api_key: Option<String>,
    /// Model id, e.g. "facebook/bart-large-mnli"
    pub model: String,
    /// Ask the service to block until a cold model is loaded
    pub wait_for_model: bool,
    /// Timeout and retry policy
    pub http: HttpSettings,
}

impl HuggingFaceClassifierConfig {
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
}

#[derive(Debug, Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
    parameters: ClassificationParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ClassificationParameters<'a> {
    candidate_labels: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct SequenceScores {
    labels: Vec<String>,
    scores: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Pairs(Vec<LabelScore>),
    Sequence(SequenceScores),
    SequenceBatch(Vec<SequenceScores>),
}

impl ClassificationResponse {
    fn into_scores(self) -> std::result::Result<Vec<LabelScore>, ServiceError> {
        let sequence = match self {
            ClassificationResponse::Pairs(pairs) => return Ok(pairs),
            ClassificationResponse::Sequence(sequence) => sequence,
            ClassificationResponse::SequenceBatch(mut batch) => {
                if batch.len() != 1 {
                    return Err(ServiceError::InvalidResponse(format!(
                        "expected one classified sequence, got {}",
                        batch.len()
                    )));
                }
                batch.remove(0)
            }
        };

        if sequence.labels.len() != sequence.scores.len() {
            return Err(ServiceError::InvalidResponse(format!(
                "{} labels but {} scores",
                sequence.labels.len(),
                sequence.scores.len()
            )));
        }

        Ok(sequence
            .labels
            .into_iter()
            .zip(sequence.scores)
            .map(|(label, score)| LabelScore { label, score })
            .collect())
    }
}

/// Classifier backed by the Hugging Face zero-shot classification pipeline
pub struct HuggingFaceClassifier {
    client: InferenceClient,
    config: HuggingFaceClassifierConfig,
}

impl HuggingFaceClassifier {
    pub fn new(config: HuggingFaceClassifierConfig) -> Result<Self> {
        let auth = match &config.api_key {
            Some(key) => Auth::Bearer(key.clone()),
            None => Auth::None,
        };
        let mut client =
            InferenceClient::new(&config.http, auth).map_err(SearchError::ClassificationService)?;
        if config.wait_for_model {
            client = client.with_header("x-wait-for-model", "true");
        }

        Ok(Self { client, config })
    }

    fn pipeline_url(&self) -> String {
        format!(
            "{}/{}/pipeline/zero-shot-classification",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl ClassificationProvider for HuggingFaceClassifier {
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>> {
        if labels.is_empty() {
            return Ok(vec![]);
        }

        let request = ClassificationRequest {
            inputs: text,
            parameters: ClassificationParameters {
                candidate_labels: labels,
            },
        };
        let response: ClassificationResponse = self
            .client
            .post_json(&self.pipeline_url(), &request)
            .await
            .map_err(SearchError::ClassificationService)?;

        let mut scores = response
            .into_scores()
            .map_err(SearchError::ClassificationService)?;
        sort_descending(&mut scores);

        debug!(
            "Classified '{}': top label {:?}",
            text,
            scores.first().map(|s| (&s.label, s.score))
        );
        Ok(scores)
    }

    async fn check_status(&self) -> Result<ProviderStatus> {
        let request = ClassificationRequest {
            inputs: "health check",
            parameters: ClassificationParameters {
                candidate_labels: &["location"],
            },
        };
        match self.client.probe(&self.pipeline_url(), &request).await {
            Ok(latency) => Ok(ProviderStatus::healthy("huggingface", &self.config.model)
                .with_latency(latency.as_millis() as u64)),
            Err(e) => Ok(ProviderStatus::unavailable(
                "huggingface",
                &self.config.model,
                e.to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for HuggingFaceClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceClassifier")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}
