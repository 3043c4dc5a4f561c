//! Single-query lifecycle
//!
//! Ensures the corpus is indexed, extracts criteria, runs the similarity
//! search, and keeps the top [`PRESENT_LIMIT`] results for presentation.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::classification::ClassificationProvider;
use crate::corpus::Corpus;
use crate::criteria::CriteriaExtractor;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::indexer::{CorpusIndexer, IndexStats};
use crate::schema::{FilterCriteria, RankedResult};
use crate::search::{FilterMode, SearchOutcome, SimilaritySearcher};
use crate::store::VectorStore;

/// Results shown per query
pub const PRESENT_LIMIT: usize = 3;

/// Query used when the user enters nothing
pub const DEFAULT_QUERY: &str = "Developer|Boston|Full-Time";

/// Pick the query to run from raw user input.
///
/// Missing or blank input yields `default`. Otherwise only the line ending is
/// stripped; terms are left as typed.
pub fn resolve_query(input: Option<&str>, default: &str) -> String {
    match input {
        Some(raw) if !raw.trim().is_empty() => raw.trim_end_matches(['\r', '\n']).to_string(),
        _ => default.to_string(),
    }
}

/// Everything produced for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryReport {
    pub query: String,
    pub criteria: FilterCriteria,
    pub filter_mode: FilterMode,
    /// Search result, already filtered and cut to [`PRESENT_LIMIT`]
    pub outcome: SearchOutcome,
}

impl QueryReport {
    /// Results to present, best first
    pub fn top(&self) -> &[RankedResult] {
        self.outcome.results()
    }
}

/// Wires indexing, criteria extraction, and search around one corpus
pub struct QueryOrchestrator {
    corpus: Corpus,
    indexer: CorpusIndexer,
    extractor: CriteriaExtractor,
    searcher: SimilaritySearcher,
    filter_mode: FilterMode,
    index_stats: Option<IndexStats>,
}

impl QueryOrchestrator {
    pub fn new(
        corpus: Corpus,
        embedder: Arc<dyn EmbeddingProvider>,
        classifier: Arc<dyn ClassificationProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        let collection = collection.into();
        Self {
            corpus,
            indexer: CorpusIndexer::new(embedder.clone(), store.clone(), collection.clone()),
            extractor: CriteriaExtractor::new(classifier),
            searcher: SimilaritySearcher::new(embedder, store, collection),
            filter_mode: FilterMode::default(),
            index_stats: None,
        }
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// Index the corpus unless this orchestrator already has.
    ///
    /// Indexing errors propagate; nothing is cached on failure so a later
    /// call tries again.
    pub async fn ensure_indexed(&mut self) -> Result<IndexStats> {
        if let Some(stats) = &self.index_stats {
            return Ok(stats.clone());
        }
        let stats = self.indexer.index(&mut self.corpus).await?;
        self.index_stats = Some(stats.clone());
        Ok(stats)
    }

    /// Run one query end to end.
    ///
    /// Indexing and classification failures are errors. Search failures are
    /// reported inside the returned [`QueryReport`].
    pub async fn run(&mut self, raw_query: &str) -> Result<QueryReport> {
        self.ensure_indexed().await?;

        let criteria = self.extractor.extract(raw_query).await?;
        let mut outcome = self.searcher.search(raw_query, &self.corpus).await;
        outcome.apply_filter(&criteria, self.filter_mode);
        outcome.truncate(PRESENT_LIMIT);

        info!(
            "Query '{}': {} criteria, {} results{}",
            raw_query,
            criteria.populated().count(),
            outcome.results().len(),
            if outcome.is_failed() { " (search failed)" } else { "" }
        );

        Ok(QueryReport {
            query: raw_query.to_string(),
            criteria,
            filter_mode: self.filter_mode,
            outcome,
        })
    }
}

impl std::fmt::Debug for QueryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("postings", &self.corpus.len())
            .field("indexer", &self.indexer)
            .field("filter_mode", &self.filter_mode)
            .field("indexed", &self.index_stats.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_uses_default() {
        assert_eq!(resolve_query(None, DEFAULT_QUERY), DEFAULT_QUERY);
        assert_eq!(resolve_query(Some(""), DEFAULT_QUERY), DEFAULT_QUERY);
        assert_eq!(resolve_query(Some("  \n"), DEFAULT_QUERY), DEFAULT_QUERY);
    }

    #[test]
    fn test_input_kept_as_typed() {
        assert_eq!(
            resolve_query(Some("Nurse | Denver\n"), DEFAULT_QUERY),
            "Nurse | Denver"
        );
    }
}
