//! Jobmatch Search - Semantic job search with zero-shot query understanding
//!
//! This crate matches free-text job queries against a corpus of postings.
//!
//! # Features
//!
//! - **Criteria extraction**: pipe-separated query terms are classified into
//!   location, job title, company, and employment status
//! - **Similarity search**: postings and queries are embedded and ranked by
//!   cosine distance
//! - **Pluggable backends**: Hugging Face or OpenAI-compatible embeddings,
//!   in-memory or Qdrant vector storage
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobmatch_search::{Corpus, InMemoryVectorStore, QueryOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let corpus = Corpus::load("job_postings.json")?;
//!     let mut orchestrator = QueryOrchestrator::new(
//!         corpus,
//!         embedder,
//!         classifier,
//!         Arc::new(InMemoryVectorStore::new()),
//!         "job_collection",
//!     );
//!
//!     let report = orchestrator.run("Developer|Boston|Full-Time").await?;
//!     for result in report.top() {
//!         println!("{} ({:.3})", result.posting.job_title, result.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod classification;
pub mod corpus;
pub mod criteria;
pub mod embeddings;
pub mod error;
pub mod indexer;
mod inference;
pub mod orchestrator;
pub mod schema;
pub mod search;
pub mod store;

// Re-exports for convenience
pub use corpus::Corpus;
pub use criteria::{CriteriaExtractor, ACCEPTANCE_THRESHOLD, TERM_DELIMITER};
pub use error::{Result, SearchError, ServiceError};
pub use indexer::{CorpusIndexer, IndexStats};
pub use inference::{HttpSettings, DEFAULT_TIMEOUT_SECS};
pub use orchestrator::{resolve_query, QueryOrchestrator, QueryReport, DEFAULT_QUERY, PRESENT_LIMIT};
pub use schema::{CriteriaField, FilterCriteria, JobPosting, RankedResult, DEFAULT_COLLECTION};
pub use search::{FilterMode, SearchOutcome, SimilaritySearcher, TOP_K};
pub use store::{InMemoryVectorStore, QdrantConfig, QdrantStore, QueryResponse, VectorRecord, VectorStore};

// Re-export provider abstraction types
pub use classification::{
    create_classifier, ClassificationProvider, HuggingFaceClassifier, HuggingFaceClassifierConfig,
    LabelScore,
};
pub use embeddings::{
    create_provider, EmbeddingConfig, EmbeddingProvider, EmbeddingProviderType,
    HuggingFaceEmbedder, HuggingFaceEmbedderConfig, OpenAIConfig, OpenAIEmbedder, ProviderStatus,
};
