//! Qdrant-backed ANN index

use super::index::{AnnHit, AnnIndex, SimilarityMetric};
use crate::error::{MemoryError, Result};
use async_trait::async_trait;
use qdrant_client::prelude::{Payload, QdrantClient};
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, CreateCollection, Distance, PointStruct,
    SearchPoints, Value, VectorParams, VectorsConfig,
};
use tracing::{info, warn};

fn payload_str(value: &Value) -> Option<String> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Qdrant collection settings
#[derive(Debug, Clone)]
pub struct QdrantIndexConfig {
    pub collection_name: String,
    pub vector_size: usize,
}

impl Default for QdrantIndexConfig {
    fn default() -> Self {
        Self {
            collection_name: "memory_fragments".to_string(),
            vector_size: 1024,
        }
    }
}

/// ANN index persisted in a Qdrant collection (cosine distance)
pub struct QdrantIndex {
    client: QdrantClient,
    config: QdrantIndexConfig,
}

impl QdrantIndex {
    pub async fn new(client: QdrantClient, config: QdrantIndexConfig) -> Result<Self> {
        let index = Self { client, config };
        index.ensure_collection().await?;
        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| MemoryError::Index(format!("Failed to list collections: {}", e)))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.config.collection_name);

        if !exists {
            info!(
                "Creating vector collection: {}",
                self.config.collection_name
            );

            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.config.collection_name.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(qdrant_client::qdrant::vectors_config::Config::Params(
                            VectorParams {
                                size: self.config.vector_size as u64,
                                distance: Distance::Cosine.into(),
                                ..Default::default()
                            },
                        )),
                    }),
                    ..Default::default()
                })
                .await
                .map_err(|e| MemoryError::Index(format!("Failed to create collection: {}", e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl AnnIndex for QdrantIndex {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<AnnHit>> {
        let result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.config.collection_name.clone(),
                vector: vector.to_vec(),
                limit: k as u64,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                // An absent or corrupt collection degrades to no hits; the
                // caller falls back to symbolic-only scoring.
                warn!("Vector search failed, returning no hits: {}", e);
                return Ok(Vec::new());
            }
        };

        let hits = response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = point
                    .payload
                    .get("fragment_id")
                    .and_then(payload_str)
                    .or_else(|| {
                        match point.id.as_ref().and_then(|id| id.point_id_options.as_ref())? {
                            PointIdOptions::Num(n) => Some(n.to_string()),
                            PointIdOptions::Uuid(u) => Some(u.clone()),
                        }
                    })?;
                let content = point.payload.get("content").and_then(payload_str);
                Some(AnnHit {
                    id,
                    raw_score: point.score,
                    content,
                })
            })
            .collect();

        Ok(hits)
    }

    async fn add(&self, id: &str, vector: Vec<f32>, content: Option<String>) -> Result<()> {
        let mut payload = Payload::new();
        payload.insert("fragment_id", id.to_string());
        if let Some(content) = content {
            payload.insert("content", content);
        }

        let point = PointStruct::new(uuid::Uuid::new_v4().to_string(), vector, payload);

        self.client
            .upsert_points(&self.config.collection_name, None, vec![point], None)
            .await
            .map_err(|e| MemoryError::Index(format!("Failed to index vector: {}", e)))?;

        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        // Qdrant persists on write.
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        self.ensure_collection().await
    }

    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::Cosine
    }
}
