//! Embedding-based product ranking

use storefront_chat_config::RankingConfig;
use storefront_chat_core::{Product, TierFailure};

use crate::cache::EmbeddingCache;
use crate::scored::ScoredProduct;

/// Cosine similarity; 0 when either vector has zero norm or dimensions differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Clone)]
pub struct SemanticRanker {
    cache: EmbeddingCache,
    top_k: usize,
    min_similarity: f32,
}

impl SemanticRanker {
    pub fn new(cache: EmbeddingCache, config: &RankingConfig) -> Self {
        Self {
            cache,
            top_k: config.semantic_top_k.max(1),
            min_similarity: config.min_similarity,
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Rank `products` against `query`
    ///
    /// A query that cannot be embedded, or a shortlist left empty after the
    /// similarity floor, is a tier failure so the caller moves on to keyword
    /// ranking. Products whose own embedding fails are skipped. Missing
    /// vectors are generated with the same pacing as batch generation.
    pub async fn rank(
        &self,
        shop_id: &str,
        query: &str,
        products: &[Product],
    ) -> Result<Vec<ScoredProduct>, TierFailure> {
        let query_vector = self.cache.embed(query).await.map_err(TierFailure::from)?;
        let mut called = true;

        let mut scored = Vec::with_capacity(products.len());
        for product in products {
            let vector = match self.cache.ensure_paced(shop_id, product, &mut called).await {
                Ok(vector) => vector,
                Err(e) => {
                    tracing::warn!(shop = %shop_id, product = %product.id, error = %e, "Skipping product without embedding");
                    continue;
                }
            };

            let similarity = cosine_similarity(&query_vector, &vector);
            if similarity >= self.min_similarity && similarity > 0.0 {
                scored.push((product, similarity));
            }
        }

        // Stable: equal similarities keep catalog order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        if scored.is_empty() {
            return Err(TierFailure::Empty);
        }

        tracing::debug!(shop = %shop_id, shortlisted = scored.len(), top = scored[0].1, "Semantic ranking done");

        Ok(scored
            .into_iter()
            .map(|(product, similarity)| ScoredProduct::semantic(product.clone(), similarity))
            .collect())
    }
}
