//! In-process vector store
//!
//! Exact cosine search over every record in a collection. Suited to corpora
//! that fit in memory; nothing survives the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{QueryResponse, VectorRecord, VectorStore};
use crate::error::{Result, SearchError};

#[derive(Debug, Default)]
struct Collection {
    dimension: usize,
    /// Records keyed by id
    records: HashMap<String, (String, Vec<f32>)>,
}

/// Vector store held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document stored for `id`, if any
    pub async fn document(&self, collection: &str, id: &str) -> Option<String> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|c| c.records.get(id))
            .map(|(document, _)| document.clone())
    }
}

/// Cosine distance `1 - cos(a, b)`; zero vectors are maximally distant
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

fn not_found(collection: &str) -> SearchError {
    SearchError::Store(format!("collection '{}' not found", collection))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections.get(collection) {
            Some(existing) if existing.dimension != dimension => {
                Err(SearchError::DimensionMismatch {
                    expected: existing.dimension,
                    actual: dimension,
                })
            }
            Some(_) => Ok(()),
            None => {
                debug!("Creating in-memory collection '{}' (dim={})", collection, dimension);
                collections.insert(
                    collection.to_string(),
                    Collection {
                        dimension,
                        records: HashMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;

        // Validate the whole batch before writing any of it
        if let Some(bad) = records.iter().find(|r| r.vector.len() != target.dimension) {
            return Err(SearchError::DimensionMismatch {
                expected: target.dimension,
                actual: bad.vector.len(),
            });
        }

        for record in records {
            target
                .records
                .insert(record.id, (record.document, record.vector));
        }
        Ok(())
    }

    async fn query(&self, collection: &str, vector: Vec<f32>, k: usize) -> Result<QueryResponse> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;

        if vector.len() != target.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: target.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(&str, f32)> = target
            .records
            .iter()
            .map(|(id, (_, stored))| (id.as_str(), cosine_distance(&vector, stored)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        scored.truncate(k);

        let (ids, distances) = scored
            .into_iter()
            .map(|(id, distance)| (id.to_string(), distance))
            .unzip();
        Ok(QueryResponse { ids, distances })
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.records.len() as u64)
            .unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
