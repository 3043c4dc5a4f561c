//! Similarity search over an indexed corpus
//!
//! Embeds the query, asks the vector store for the nearest [`TOP_K`] records,
//! and joins the returned ids back to full postings. Failures never escape:
//! they come back as [`SearchOutcome::Failed`] so callers can tell "no
//! matches" apart from "search broke".

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::corpus::Corpus;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, SearchError, ServiceError};
use crate::schema::{FilterCriteria, RankedResult};
use crate::store::VectorStore;

/// Neighbors requested from the store per query
pub const TOP_K: usize = 3;

/// How extracted criteria affect results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Criteria are reported alongside results but not enforced
    #[default]
    Diagnostic,
    /// Ranked results that fail any populated criterion are dropped
    PostFilter,
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Diagnostic => write!(f, "diagnostic"),
            FilterMode::PostFilter => write!(f, "post-filter"),
        }
    }
}

/// Result of a similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Search ran; results ascending by distance, possibly empty
    Matches { results: Vec<RankedResult> },
    /// Embedding or store failure
    Failed { reason: String },
}

impl SearchOutcome {
    /// Ranked results; empty for a failed search
    pub fn results(&self) -> &[RankedResult] {
        match self {
            SearchOutcome::Matches { results } => results.as_slice(),
            SearchOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SearchOutcome::Failed { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            SearchOutcome::Failed { reason } => Some(reason.as_str()),
            SearchOutcome::Matches { .. } => None,
        }
    }

    /// Apply `mode` with `criteria`; ranking order is preserved
    pub fn apply_filter(&mut self, criteria: &FilterCriteria, mode: FilterMode) {
        if mode == FilterMode::Diagnostic {
            return;
        }
        if let SearchOutcome::Matches { results } = self {
            let before = results.len();
            results.retain(|result| criteria.matches(&result.posting));
            debug!("Post-filter kept {}/{} results", results.len(), before);
        }
    }

    /// Keep at most `limit` results
    pub fn truncate(&mut self, limit: usize) {
        if let SearchOutcome::Matches { results } = self {
            results.truncate(limit);
        }
    }
}

/// Runs nearest-neighbor queries and joins hits to the corpus
pub struct SimilaritySearcher {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl SimilaritySearcher {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    /// Search `corpus` for postings similar to `query`
    pub async fn search(&self, query: &str, corpus: &Corpus) -> SearchOutcome {
        // Nothing can join, and an empty corpus never creates the collection
        if corpus.is_empty() {
            debug!("Corpus is empty; skipping similarity search for '{}'", query);
            return SearchOutcome::Matches { results: vec![] };
        }

        match self.ranked(query, corpus).await {
            Ok(results) => SearchOutcome::Matches { results },
            Err(e) => {
                warn!("Similarity search for '{}' failed: {}", query, e);
                SearchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn ranked(&self, query: &str, corpus: &Corpus) -> Result<Vec<RankedResult>> {
        let mut vectors = self.embedder.embed(vec![query.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(SearchError::EmbeddingService(ServiceError::InvalidResponse(
                format!("expected 1 query embedding, got {}", vectors.len()),
            )));
        }
        let vector = vectors.remove(0);

        let response = self.store.query(&self.collection, vector, TOP_K).await?;
        response.validate()?;

        let mut results: Vec<RankedResult> = response
            .hits()
            .filter_map(|(id, distance)| match corpus.find(id) {
                Some(posting) => Some(RankedResult {
                    id: id.to_string(),
                    score: distance,
                    posting: posting.clone(),
                }),
                None => {
                    debug!("Dropping hit '{}': no posting with that id", id);
                    None
                }
            })
            .collect();

        // Store order should already be ascending; do not rely on it
        results.sort_by(|a, b| a.score.total_cmp(&b.score));
        results.truncate(TOP_K);
        Ok(results)
    }
}

impl std::fmt::Debug for SimilaritySearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilaritySearcher")
            .field("store", &self.store.backend_name())
            .field("collection", &self.collection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CriteriaField, JobPosting};

    fn result(id: &str, score: f32, location: &str) -> RankedResult {
        RankedResult {
            id: id.into(),
            score,
            posting: JobPosting {
                job_id: id.into(),
                job_title: "Engineer".into(),
                job_description: String::new(),
                job_type: "Full-Time".into(),
                location: location.into(),
                company: "Acme".into(),
            },
        }
    }

    fn outcome() -> SearchOutcome {
        SearchOutcome::Matches {
            results: vec![
                result("1", 0.1, "Boston"),
                result("2", 0.2, "Denver"),
                result("3", 0.3, "Boston, MA"),
            ],
        }
    }

    fn boston() -> FilterCriteria {
        let mut criteria = FilterCriteria::default();
        criteria.set(CriteriaField::Location, "boston");
        criteria
    }

    #[test]
    fn test_diagnostic_mode_keeps_everything() {
        let mut outcome = outcome();
        outcome.apply_filter(&boston(), FilterMode::Diagnostic);
        assert_eq!(outcome.results().len(), 3);
    }

    #[test]
    fn test_post_filter_preserves_order() {
        let mut outcome = outcome();
        outcome.apply_filter(&boston(), FilterMode::PostFilter);
        let ids: Vec<&str> = outcome.results().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_failed_outcome() {
        let mut outcome = SearchOutcome::Failed {
            reason: "store down".into(),
        };
        outcome.apply_filter(&boston(), FilterMode::PostFilter);
        outcome.truncate(1);
        assert!(outcome.is_failed());
        assert!(outcome.results().is_empty());
        assert_eq!(outcome.failure_reason(), Some("store down"));
    }

    #[test]
    fn test_outcome_serializes_with_status() {
        let json = serde_json::to_value(SearchOutcome::Failed {
            reason: "x".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "x");

        let json = serde_json::to_value(outcome()).unwrap();
        assert_eq!(json["status"], "matches");
        assert_eq!(json["results"][0]["location"], "Boston");
    }

    #[test]
    fn test_filter_mode_serde() {
        assert_eq!(
            serde_json::to_string(&FilterMode::PostFilter).unwrap(),
            "\"post-filter\""
        );
        assert_eq!(FilterMode::default(), FilterMode::Diagnostic);
        assert_eq!(FilterMode::PostFilter.to_string(), "post-filter");
    }
}
