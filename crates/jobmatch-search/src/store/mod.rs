//! Vector store abstraction
//!
//! The store keeps `(id, document, vector)` triples per named collection and
//! answers nearest-neighbor queries ordered by ascending distance.
//!
//! ```text
//! VectorStore (trait)
//!     ├── InMemoryVectorStore - process-local, exact cosine search
//!     └── QdrantStore         - qdrant-client backed collections
//! ```

mod memory;
mod qdrant;

use async_trait::async_trait;

use crate::error::{Result, SearchError};

pub use memory::InMemoryVectorStore;
pub use qdrant::{QdrantConfig, QdrantStore};

/// One entry written to a collection
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Job id; unique within a collection, upserts overwrite by id
    pub id: String,
    /// Text that was embedded
    pub document: String,
    pub vector: Vec<f32>,
}

/// Nearest-neighbor result as parallel arrays, ascending by distance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub ids: Vec<String>,
    pub distances: Vec<f32>,
}

impl QueryResponse {
    /// Reject responses whose arrays disagree in length
    pub fn validate(&self) -> Result<()> {
        if self.ids.len() != self.distances.len() {
            return Err(SearchError::Store(format!(
                "malformed query response: {} ids but {} distances",
                self.ids.len(),
                self.distances.len()
            )));
        }
        Ok(())
    }

    /// Iterate `(id, distance)` pairs in store order
    pub fn hits(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.distances.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Vector index used for indexing and similarity search
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if missing. Existing collections are kept.
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()>;

    /// Insert or overwrite records by id
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Return up to `k` nearest records to `vector`, ascending by distance
    async fn query(&self, collection: &str, vector: Vec<f32>, k: usize) -> Result<QueryResponse>;

    /// Number of records in the collection, 0 when it does not exist
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Short backend name for status output
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_validation() {
        let ok = QueryResponse {
            ids: vec!["1".into(), "2".into()],
            distances: vec![0.1, 0.2],
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.hits().collect::<Vec<_>>(), vec![("1", 0.1), ("2", 0.2)]);

        let bad = QueryResponse {
            ids: vec!["1".into()],
            distances: vec![],
        };
        assert!(matches!(bad.validate(), Err(SearchError::Store(_))));
    }
}
