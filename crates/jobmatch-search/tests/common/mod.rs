//! Test doubles shared by integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobmatch_search::{
    ClassificationProvider, EmbeddingProvider, EmbeddingProviderType, InMemoryVectorStore,
    JobPosting, LabelScore, ProviderStatus, QueryResponse, Result, SearchError, ServiceError,
    VectorRecord, VectorStore,
};

pub const DIM: usize = 32;

pub fn posting(id: &str, title: &str, location: &str, job_type: &str, company: &str) -> JobPosting {
    JobPosting {
        job_id: id.into(),
        job_title: title.into(),
        job_description: format!("{} role at {}", title, company),
        job_type: job_type.into(),
        location: location.into(),
        company: company.into(),
    }
}

/// Bag-of-words vector: lowercase alphanumeric tokens hashed into buckets
pub fn hash_embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIM];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        // FNV-1a
        let mut hash: u32 = 0x811c9dc5;
        for byte in word.bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        vector[hash as usize % DIM] += 1.0;
    }
    vector
}

/// Deterministic embedder; can be told to fail after some number of calls
pub struct HashingEmbedder {
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl HashingEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_after: None,
        })
    }

    /// Succeeds for the first `n` calls, then reports the service unavailable
    pub fn failing_after(n: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_after: Some(n),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(SearchError::EmbeddingService(ServiceError::Unavailable(
                "embedding service down".into(),
            )));
        }
        Ok(texts.iter().map(|t| hash_embed(t)).collect())
    }

    async fn check_status(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::healthy("fake", "hashing"))
    }

    fn embedding_dim(&self) -> usize {
        DIM
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::HuggingFace
    }
}

/// Classifier answering from a term -> (label, score) script.
///
/// Unscripted terms get a flat 0.25 across all labels.
pub struct ScriptedClassifier {
    script: HashMap<String, (String, f32)>,
    failing_term: Option<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn new(script: &[(&str, &str, f32)]) -> Self {
        Self {
            script: script
                .iter()
                .map(|(term, label, score)| (term.to_string(), (label.to_string(), *score)))
                .collect(),
            failing_term: None,
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Answers for `term` arrive only after `millis`
    pub fn delaying(mut self, term: &str, millis: u64) -> Self {
        self.delays
            .insert(term.to_string(), Duration::from_millis(millis));
        self
    }

    /// Classifying `term` returns a service error
    pub fn failing_on(mut self, term: &str) -> Self {
        self.failing_term = Some(term.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Terms in the order their answers were produced
    pub fn completions(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassificationProvider for ScriptedClassifier {
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>> {
        self.calls.lock().unwrap().push(text.to_string());

        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(text.to_string());

        if self.failing_term.as_deref() == Some(text) {
            return Err(SearchError::ClassificationService(ServiceError::Unavailable(
                "classifier down".into(),
            )));
        }

        let mut scores: Vec<LabelScore> = match self.script.get(text) {
            Some((winner, score)) => {
                let rest = (1.0 - score) / (labels.len().max(2) - 1) as f32;
                labels
                    .iter()
                    .map(|label| {
                        let s = if *label == winner.as_str() { *score } else { rest };
                        LabelScore::new(*label, s)
                    })
                    .collect()
            }
            None => labels.iter().map(|label| LabelScore::new(*label, 0.25)).collect(),
        };
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scores)
    }

    async fn check_status(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::healthy("fake", "scripted"))
    }
}

/// Store that accepts writes but answers every query from a script
pub struct ScriptedStore {
    inner: InMemoryVectorStore,
    response: std::result::Result<QueryResponse, String>,
}

impl ScriptedStore {
    pub fn returning(ids: &[&str], distances: &[f32]) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryVectorStore::new(),
            response: Ok(QueryResponse {
                ids: ids.iter().map(|id| id.to_string()).collect(),
                distances: distances.to_vec(),
            }),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryVectorStore::new(),
            response: Err(reason.to_string()),
        })
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        self.inner.ensure_collection(collection, dimension).await
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        self.inner.upsert(collection, records).await
    }

    async fn query(&self, _collection: &str, _vector: Vec<f32>, _k: usize) -> Result<QueryResponse> {
        self.response.clone().map_err(SearchError::Store)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        self.inner.count(collection).await
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}
