//! Persistent per-shop product embedding cache
//!
//! Vectors are keyed by (shop, product) and tagged with the model that made
//! them. A stored vector from another model, or with the wrong dimension,
//! reads as a miss and is regenerated.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use storefront_chat_config::EmbeddingConfig;
use storefront_chat_core::Product;
use storefront_chat_persistence::{EmbeddingStore, ProductEmbedding};
use storefront_chat_text_processing::embedding_text;

use crate::embeddings::EmbeddingProvider;
use crate::RagError;

/// Outcome counts of a batch generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub cached: usize,
    pub generated: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.cached + self.generated + self.failed
    }
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub text_budget_chars: usize,
    pub batch_delay: Duration,
    pub timeout: Duration,
}

impl From<&EmbeddingConfig> for CacheOptions {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            text_budget_chars: config.text_budget_chars,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

#[derive(Clone)]
pub struct EmbeddingCache {
    store: Arc<dyn EmbeddingStore>,
    provider: Arc<dyn EmbeddingProvider>,
    options: CacheOptions,
}

impl EmbeddingCache {
    pub fn new(
        store: Arc<dyn EmbeddingStore>,
        provider: Arc<dyn EmbeddingProvider>,
        options: CacheOptions,
    ) -> Self {
        Self {
            store,
            provider,
            options,
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Cached vector for a product, if one from the active model exists
    pub async fn get(&self, shop_id: &str, product_id: &str) -> Option<Vec<f32>> {
        let entry = match self.store.get(shop_id, product_id).await {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(shop = %shop_id, product = %product_id, error = %e, data_error = e.is_data_error(), "Treating unreadable embedding as a miss");
                return None;
            }
        };

        if entry.model_id != self.provider.model_id() {
            tracing::debug!(
                shop = %shop_id,
                product = %product_id,
                stored_model = %entry.model_id,
                active_model = %self.provider.model_id(),
                "Embedding from another model, regenerating"
            );
            return None;
        }
        if entry.vector.is_empty() || entry.vector.len() != self.provider.dimension() {
            tracing::debug!(shop = %shop_id, product = %product_id, len = entry.vector.len(), "Embedding has wrong dimension");
            return None;
        }
        Some(entry.vector)
    }

    /// Cached vector, or a freshly generated and stored one
    pub async fn ensure(&self, shop_id: &str, product: &Product) -> Result<Vec<f32>, RagError> {
        if let Some(vector) = self.get(shop_id, &product.id).await {
            return Ok(vector);
        }
        self.generate(shop_id, product).await
    }

    /// Like [`ensure`](Self::ensure), but paced for remote providers
    ///
    /// `called` tracks whether a provider call already happened in the
    /// current run; each generation after the first waits `batch_delay`.
    pub async fn ensure_paced(&self, shop_id: &str, product: &Product, called: &mut bool) -> Result<Vec<f32>, RagError> {
        if let Some(vector) = self.get(shop_id, &product.id).await {
            return Ok(vector);
        }
        self.pause(called).await;
        self.generate(shop_id, product).await
    }

    async fn pause(&self, called: &mut bool) {
        if *called && self.provider.is_remote() && !self.options.batch_delay.is_zero() {
            tokio::time::sleep(self.options.batch_delay).await;
        }
        *called = true;
    }

    async fn generate(&self, shop_id: &str, product: &Product) -> Result<Vec<f32>, RagError> {
        let text = embedding_text(&product.title, &product.description, self.options.text_budget_chars);
        let vector = self.embed(&text).await?;

        let row = ProductEmbedding::new(shop_id, &product.id, self.provider.model_id(), vector.clone());
        if let Err(e) = self.store.upsert(&row).await {
            // The vector is still usable for this request
            tracing::warn!(shop = %shop_id, product = %product.id, error = %e, "Failed to persist embedding");
        }

        metrics::counter!("storefront_chat_embedding_generated_total").increment(1);
        Ok(vector)
    }

    /// Embed arbitrary text (a shopper query) under the configured timeout
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let vector = tokio::time::timeout(self.options.timeout, self.provider.embed(text))
            .await
            .map_err(|_| RagError::Timeout(self.options.timeout))??;

        if vector.len() != self.provider.dimension() {
            return Err(RagError::Embedding(format!(
                "expected dimension {}, got {}",
                self.provider.dimension(),
                vector.len()
            )));
        }
        Ok(vector)
    }

    /// Ensure every product has a vector
    ///
    /// Sequential; remote providers get a pause between generation calls.
    /// A failing product is counted and skipped.
    pub async fn ensure_batch(&self, shop_id: &str, products: &[Product]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut called = false;

        for product in products {
            if self.get(shop_id, &product.id).await.is_some() {
                summary.cached += 1;
                continue;
            }

            self.pause(&mut called).await;
            match self.generate(shop_id, product).await {
                Ok(_) => summary.generated += 1,
                Err(e) => {
                    tracing::warn!(shop = %shop_id, product = %product.id, error = %e, "Embedding generation failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            shop = %shop_id,
            cached = summary.cached,
            generated = summary.generated,
            failed = summary.failed,
            "Batch embedding finished"
        );
        summary
    }

    /// Delete all vectors for a shop
    pub async fn clear(&self, shop_id: &str) -> Result<u64, RagError> {
        Ok(self.store.clear_shop(shop_id).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use storefront_chat_persistence::InMemoryStore;
    use tokio::time::Instant;

    /// Hash embedder that counts calls and can refuse chosen texts
    pub(crate) struct CountingEmbedder {
        pub inner: HashEmbedder,
        pub calls: AtomicUsize,
        pub called_at: Mutex<Vec<Instant>>,
        pub fail_on: Option<&'static str>,
        pub remote: bool,
    }

    impl CountingEmbedder {
        pub fn new() -> Self {
            Self {
                inner: HashEmbedder::new(1024),
                calls: AtomicUsize::new(0),
                called_at: Mutex::new(Vec::new()),
                fail_on: None,
                remote: false,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.called_at.lock().unwrap().push(Instant::now());
            if let Some(needle) = self.fail_on {
                if text.contains(needle) {
                    return Err(RagError::Embedding("refused".to_string()));
                }
            }
            Ok(self.inner.embed_sync(text))
        }

        fn model_id(&self) -> &str {
            self.inner.model_id()
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn is_remote(&self) -> bool {
            self.remote
        }
    }

    fn cache_with(provider: Arc<CountingEmbedder>) -> (EmbeddingCache, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let options = CacheOptions {
            text_budget_chars: 2000,
            batch_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(1),
        };
        (EmbeddingCache::new(store.clone(), provider, options), store)
    }

    #[tokio::test]
    async fn test_ensure_generates_once_then_hits() {
        let provider = Arc::new(CountingEmbedder::new());
        let (cache, _) = cache_with(provider.clone());
        let product = Product::new("p1", "Red Dress", 49.0).with_description("<p>Light cotton</p>");

        assert!(cache.get("shop", "p1").await.is_none());
        let first = cache.ensure("shop", &product).await.unwrap();
        let second = cache.ensure("shop", &product).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(cache.get("shop", "p1").await.is_some());
    }

    #[tokio::test]
    async fn test_other_model_is_a_miss() {
        let provider = Arc::new(CountingEmbedder::new());
        let (cache, store) = cache_with(provider.clone());
        let stale = ProductEmbedding::new("shop", "p1", "old-model", vec![1.0; 1024]);
        EmbeddingStore::upsert(store.as_ref(), &stale).await.unwrap();

        assert!(cache.get("shop", "p1").await.is_none());
        cache.ensure("shop", &Product::new("p1", "Scarf", 10.0)).await.unwrap();
        let stored = EmbeddingStore::get(store.as_ref(), "shop", "p1").await.unwrap().unwrap();
        assert_eq!(stored.model_id, provider.model_id());
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_a_miss() {
        let provider = Arc::new(CountingEmbedder::new());
        let (cache, store) = cache_with(provider.clone());
        let short = ProductEmbedding::new("shop", "p1", provider.model_id(), vec![1.0; 3]);
        EmbeddingStore::upsert(store.as_ref(), &short).await.unwrap();
        assert!(cache.get("shop", "p1").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_counts_and_survives_failures() {
        let mut provider = CountingEmbedder::new();
        provider.fail_on = Some("Broken");
        provider.remote = true;
        let provider = Arc::new(provider);
        let (cache, _) = cache_with(provider.clone());

        let products = vec![
            Product::new("p1", "Red Dress", 49.0),
            Product::new("p2", "Broken Lamp", 20.0),
            Product::new("p3", "Blue Scarf", 15.0),
        ];
        cache.ensure("shop", &products[0]).await.unwrap();

        let summary = cache.ensure_batch("shop", &products).await;
        assert_eq!(summary, BatchSummary { cached: 1, generated: 1, failed: 1 });
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn test_clear_removes_shop_vectors() {
        let provider = Arc::new(CountingEmbedder::new());
        let (cache, _) = cache_with(provider);
        cache.ensure("shop", &Product::new("p1", "Red Dress", 49.0)).await.unwrap();
        cache.ensure("shop", &Product::new("p2", "Blue Dress", 59.0)).await.unwrap();

        assert_eq!(cache.clear("shop").await.unwrap(), 2);
        assert!(cache.get("shop", "p1").await.is_none());
    }
}
