//! Product plus the scores a ranker assigned to it

use serde::{Deserialize, Serialize};

use storefront_chat_config::constants::personalization::MAX_RELEVANCE;
use storefront_chat_core::Product;

/// Which ranker produced a shortlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSource {
    Semantic,
    Keyword,
    Featured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product: Product,
    /// Cosine similarity, semantic tier only
    pub similarity: Option<f32>,
    /// Token-overlap score, keyword tier only
    pub keyword_score: Option<u32>,
    /// 0-100 relevance shown to the shopper
    pub relevance: u8,
}

impl ScoredProduct {
    pub fn semantic(product: Product, similarity: f32) -> Self {
        let relevance = (similarity.clamp(0.0, 1.0) * MAX_RELEVANCE as f32).round() as u8;
        Self {
            product,
            similarity: Some(similarity),
            keyword_score: None,
            relevance,
        }
    }

    pub fn keyword(product: Product, score: u32) -> Self {
        Self {
            product,
            similarity: None,
            keyword_score: Some(score),
            relevance: (score.saturating_mul(10)).min(MAX_RELEVANCE) as u8,
        }
    }

    /// Unranked product shown when nothing scored
    pub fn featured(product: Product) -> Self {
        Self {
            product,
            similarity: None,
            keyword_score: None,
            relevance: 0,
        }
    }
}

/// Stable descending sort by relevance; equal scores keep catalog order
pub fn sort_by_relevance(items: &mut [ScoredProduct]) {
    items.sort_by(|a, b| b.relevance.cmp(&a.relevance));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_scales() {
        let p = Product::new("p", "Hat", 5.0);
        assert_eq!(ScoredProduct::semantic(p.clone(), 0.834).relevance, 83);
        assert_eq!(ScoredProduct::semantic(p.clone(), -0.2).relevance, 0);
        assert_eq!(ScoredProduct::keyword(p.clone(), 7).relevance, 70);
        assert_eq!(ScoredProduct::keyword(p, 40).relevance, 100);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut items: Vec<ScoredProduct> = ["a", "b", "c"]
            .iter()
            .map(|id| ScoredProduct::keyword(Product::new(*id, *id, 1.0), if *id == "c" { 5 } else { 2 }))
            .collect();
        sort_by_relevance(&mut items);
        let ids: Vec<&str> = items.iter().map(|s| s.product.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
