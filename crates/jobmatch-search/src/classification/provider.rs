//! Zero-shot classification provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embeddings::ProviderStatus;
use crate::error::Result;

/// Confidence for one candidate label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    /// Confidence in `[0, 1]`
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Sort scores highest first; ties keep their incoming order
pub(crate) fn sort_descending(scores: &mut [LabelScore]) {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Zero-shot classification provider
///
/// Scores a text against an arbitrary set of candidate labels without
/// label-specific training.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Score `text` against `labels`
    ///
    /// Returns one entry per label, sorted descending by score. An empty
    /// label set returns an empty result without contacting the service.
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>>;

    /// Check provider connectivity
    async fn check_status(&self) -> Result<ProviderStatus>;
}
