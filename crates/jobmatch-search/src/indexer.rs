//! Corpus indexer
//!
//! Makes posting ids unique, embeds each posting's document text, and upserts
//! the `(id, document, vector)` triples into a vector store collection.
//!
//! # Example
//!
//! ```ignore
//! use jobmatch_search::{Corpus, CorpusIndexer, InMemoryVectorStore};
//!
//! let mut corpus = Corpus::load("job_postings.json")?;
//! let indexer = CorpusIndexer::new(embedder, Arc::new(InMemoryVectorStore::new()), "job_collection");
//! let stats = indexer.index(&mut corpus).await?;
//! println!("Indexed {} postings", stats.total_indexed);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, SearchError, ServiceError};
use crate::store::{VectorRecord, VectorStore};

/// Texts per embedding request
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 64;

/// Statistics from an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Postings in the corpus
    pub total_postings: usize,
    /// Postings whose id was rewritten to resolve a collision
    pub ids_rewritten: usize,
    /// Records upserted into the store
    pub total_indexed: usize,
    /// Vector dimension of the collection (0 for an empty corpus)
    pub dimension: usize,
}

/// Writes a corpus into a vector store collection
pub struct CorpusIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
    /// Batch size for embedding API calls
    embedding_batch_size: usize,
}

impl CorpusIndexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
        }
    }

    /// Set embedding batch size (minimum 1)
    pub fn with_embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = size.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Index every posting in `corpus`.
    ///
    /// Ids are deduplicated in place first, so documents and stored ids agree.
    /// All embeddings are computed before anything is written: an embedding
    /// failure leaves the store untouched.
    pub async fn index(&self, corpus: &mut Corpus) -> Result<IndexStats> {
        let ids_rewritten = corpus.assign_unique_ids();
        let total_postings = corpus.len();
        info!(
            "Indexing {} postings into '{}' ({} ids rewritten)",
            total_postings, self.collection, ids_rewritten
        );

        if corpus.is_empty() {
            return Ok(IndexStats {
                ids_rewritten,
                ..IndexStats::default()
            });
        }

        let documents: Vec<String> = corpus
            .postings()
            .iter()
            .map(|posting| posting.document_text())
            .collect();

        let mut vectors = Vec::with_capacity(documents.len());
        for (i, batch) in documents.chunks(self.embedding_batch_size).enumerate() {
            debug!("Embedding batch {} ({} documents)", i + 1, batch.len());
            let embedded = self.embedder.embed(batch.to_vec()).await?;
            if embedded.len() != batch.len() {
                return Err(SearchError::EmbeddingService(ServiceError::InvalidResponse(
                    format!("expected {} embeddings, got {}", batch.len(), embedded.len()),
                )));
            }
            vectors.extend(embedded);
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(SearchError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        self.store
            .ensure_collection(&self.collection, dimension)
            .await?;

        let records: Vec<VectorRecord> = corpus
            .postings()
            .iter()
            .zip(documents)
            .zip(vectors)
            .map(|((posting, document), vector)| VectorRecord {
                id: posting.job_id.clone(),
                document,
                vector,
            })
            .collect();
        let total_indexed = records.len();

        self.store.upsert(&self.collection, records).await?;

        info!(
            "Indexed {} postings into '{}' (dim={})",
            total_indexed, self.collection, dimension
        );

        Ok(IndexStats {
            total_postings,
            ids_rewritten,
            total_indexed,
            dimension,
        })
    }
}

impl std::fmt::Debug for CorpusIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusIndexer")
            .field("provider", &self.embedder.provider_type())
            .field("store", &self.store.backend_name())
            .field("collection", &self.collection)
            .field("embedding_batch_size", &self.embedding_batch_size)
            .finish()
    }
}
