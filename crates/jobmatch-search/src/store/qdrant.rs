//! Qdrant-backed vector store
//!
//! Collections use cosine distance. Qdrant point ids must be integers or
//! UUIDs, so each job id is hashed to a stable `u64` and the job id itself is
//! kept in the payload.

use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance,
    FieldType, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{QueryResponse, VectorRecord, VectorStore};
use crate::error::{Result, SearchError};
use crate::schema::fields;

/// Points per upsert request
const UPSERT_BATCH_SIZE: usize = 256;

/// Configuration for connecting to Qdrant
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Qdrant server URL (e.g., "http://localhost:6334")
    pub url: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl QdrantConfig {
    /// Create config with custom URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Stable Qdrant point id for a job id
pub(crate) fn point_id(job_id: &str) -> u64 {
    let digest = Sha256::digest(job_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Vector store backed by a Qdrant server
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Connect to Qdrant server
    pub async fn connect(config: QdrantConfig) -> Result<Self> {
        info!("Connecting to Qdrant at {}", config.url);

        let mut builder =
            Qdrant::from_url(&config.url).timeout(Duration::from_secs(config.timeout_secs));

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        let client = builder
            .build()
            .map_err(|e| SearchError::Store(format!("Failed to build Qdrant client: {}", e)))?;

        // Test connection by listing collections
        client
            .list_collections()
            .await
            .map_err(|e| SearchError::Store(format!("Failed to connect to Qdrant: {}", e)))?;

        info!("Successfully connected to Qdrant");
        Ok(Self { client })
    }

    /// Delete a collection if it exists
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.client.collection_exists(name).await? {
            return Ok(());
        }

        info!("Deleting collection '{}'", name);
        self.client.delete_collection(name).await?;
        Ok(())
    }

    fn to_point(record: VectorRecord) -> Result<PointStruct> {
        let id = point_id(&record.id);
        let payload = Payload::try_from(json!({
            fields::JOB_ID: record.id,
            fields::DOCUMENT: record.document,
        }))?;
        Ok(PointStruct::new(id, record.vector, payload))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()> {
        if self.client.collection_exists(collection).await? {
            debug!("Collection '{}' already exists", collection);
            return Ok(());
        }

        info!(
            "Creating collection '{}' (dim={}, distance=Cosine)",
            collection, dimension
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await?;

        // Job id lookups by keyword
        self.client
            .create_field_index(CreateFieldIndexCollectionBuilder::new(
                collection,
                fields::JOB_ID,
                FieldType::Keyword,
            ))
            .await?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let total = records.len();
        if total == 0 {
            return Ok(());
        }

        let points = records
            .into_iter()
            .map(Self::to_point)
            .collect::<Result<Vec<_>>>()?;

        for (i, batch) in points.chunks(UPSERT_BATCH_SIZE).enumerate() {
            debug!(
                "Upserting batch {}/{} ({} points) to '{}'",
                i + 1,
                total.div_ceil(UPSERT_BATCH_SIZE),
                batch.len(),
                collection
            );
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, batch.to_vec()).wait(true))
                .await?;
        }

        info!("Upserted {} points to '{}'", total, collection);
        Ok(())
    }

    async fn query(&self, collection: &str, vector: Vec<f32>, k: usize) -> Result<QueryResponse> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector, k as u64).with_payload(true),
            )
            .await?;

        let mut ids = Vec::with_capacity(response.result.len());
        let mut distances = Vec::with_capacity(response.result.len());
        for point in response.result {
            let job_id = point
                .payload
                .get(fields::JOB_ID)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    SearchError::Store(format!("point without '{}' payload", fields::JOB_ID))
                })?;
            ids.push(job_id);
            // Cosine similarity -> distance
            distances.push(1.0 - point.score);
        }

        Ok(QueryResponse { ids, distances })
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        if !self.client.collection_exists(collection).await? {
            return Ok(0);
        }
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = QdrantConfig::default();
        assert_eq!(config.url, "http://localhost:6334");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_builder() {
        let config = QdrantConfig::with_url("http://qdrant:6334").api_key("test-key");
        assert_eq!(config.url, "http://qdrant:6334");
        assert_eq!(config.api_key, Some("test-key".to_string()));
    }

    #[test]
    fn test_point_id_is_stable() {
        assert_eq!(point_id("5"), point_id("5"));
        assert_ne!(point_id("5"), point_id("5_1"));
    }

    #[tokio::test]
    #[ignore = "requires a running Qdrant at localhost:6334"]
    async fn test_round_trip_against_live_server() {
        let store = QdrantStore::connect(QdrantConfig::default()).await.unwrap();
        let collection = "jobmatch_test_round_trip";
        store.delete_collection(collection).await.unwrap();
        store.ensure_collection(collection, 2).await.unwrap();

        store
            .upsert(
                collection,
                vec![
                    VectorRecord {
                        id: "1".into(),
                        document: "one".into(),
                        vector: vec![1.0, 0.0],
                    },
                    VectorRecord {
                        id: "2".into(),
                        document: "two".into(),
                        vector: vec![0.0, 1.0],
                    },
                ],
            )
            .await
            .unwrap();

        let response = store.query(collection, vec![1.0, 0.1], 3).await.unwrap();
        assert_eq!(response.ids, vec!["1", "2"]);
        assert!(response.distances[0] <= response.distances[1]);
        assert_eq!(store.count(collection).await.unwrap(), 2);

        store.delete_collection(collection).await.unwrap();
    }
}
