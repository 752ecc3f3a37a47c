//! Product embedding persistence
//!
//! One vector per (shop, product). Regeneration overwrites the row; rows are
//! removed only by a shop-wide clear.

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored product vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEmbedding {
    pub shop_id: String,
    pub product_id: String,
    pub model_id: String,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductEmbedding {
    pub fn new(
        shop_id: impl Into<String>,
        product_id: impl Into<String>,
        model_id: impl Into<String>,
        vector: Vec<f32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            shop_id: shop_id.into(),
            product_id: product_id.into(),
            model_id: model_id.into(),
            vector,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn get(
        &self,
        shop_id: &str,
        product_id: &str,
    ) -> Result<Option<ProductEmbedding>, PersistenceError>;

    /// Insert or overwrite; `created_at` of an existing row is preserved
    async fn upsert(&self, embedding: &ProductEmbedding) -> Result<(), PersistenceError>;

    /// Delete every vector of a shop, returning how many were removed
    async fn clear_shop(&self, shop_id: &str) -> Result<u64, PersistenceError>;

    async fn count(&self, shop_id: &str) -> Result<u64, PersistenceError>;
}

#[derive(Clone)]
pub struct ScyllaEmbeddingStore {
    client: ScyllaClient,
}

impl ScyllaEmbeddingStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingStore for ScyllaEmbeddingStore {
    async fn get(
        &self,
        shop_id: &str,
        product_id: &str,
    ) -> Result<Option<ProductEmbedding>, PersistenceError> {
        let query = format!(
            "SELECT shop_id, product_id, model_id, vector, created_at, updated_at
             FROM {}.product_embeddings WHERE shop_id = ? AND product_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (shop_id, product_id))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (shop_id, product_id, model_id, vector, created_at, updated_at): (
                    String,
                    String,
                    Option<String>,
                    Option<Vec<f32>>,
                    i64,
                    i64,
                ) = row.into_typed()?;

                return Ok(Some(ProductEmbedding {
                    shop_id,
                    product_id,
                    model_id: model_id.unwrap_or_default(),
                    vector: vector.unwrap_or_default(),
                    created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
                    updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
                }));
            }
        }

        Ok(None)
    }

    async fn upsert(&self, embedding: &ProductEmbedding) -> Result<(), PersistenceError> {
        let created_at = match self.get(&embedding.shop_id, &embedding.product_id).await {
            Ok(Some(existing)) => existing.created_at,
            _ => embedding.created_at,
        };

        let query = format!(
            "INSERT INTO {}.product_embeddings (
                shop_id, product_id, model_id, vector, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &embedding.shop_id,
                    &embedding.product_id,
                    &embedding.model_id,
                    &embedding.vector,
                    created_at.timestamp_millis(),
                    embedding.updated_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::debug!(
            shop = %embedding.shop_id,
            product = %embedding.product_id,
            model = %embedding.model_id,
            dim = embedding.vector.len(),
            "Embedding stored"
        );

        Ok(())
    }

    async fn clear_shop(&self, shop_id: &str) -> Result<u64, PersistenceError> {
        let removed = self.count(shop_id).await?;

        let query = format!(
            "DELETE FROM {}.product_embeddings WHERE shop_id = ?",
            self.client.keyspace()
        );
        self.client.session().query_unpaged(query, (shop_id,)).await?;

        tracing::info!(shop = %shop_id, removed, "Embeddings cleared");
        Ok(removed)
    }

    async fn count(&self, shop_id: &str) -> Result<u64, PersistenceError> {
        let query = format!(
            "SELECT COUNT(*) FROM {}.product_embeddings WHERE shop_id = ?",
            self.client.keyspace()
        );

        let result = self.client.session().query_unpaged(query, (shop_id,)).await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (count,): (i64,) = row.into_typed()?;
                return Ok(count.max(0) as u64);
            }
        }
        Ok(0)
    }
}
