//! Token-overlap ranking used when semantic ranking is unavailable

use storefront_chat_config::constants::ranking::{DESCRIPTION_TOKEN_SCORE, TITLE_TOKEN_SCORE};
use storefront_chat_config::RankingConfig;
use storefront_chat_core::Product;
use storefront_chat_text_processing::{strip_html, tokenize};

use crate::scored::ScoredProduct;

#[derive(Debug, Clone)]
pub struct KeywordRanker {
    top_n: usize,
    featured_count: usize,
}

impl KeywordRanker {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            top_n: config.keyword_top_n.max(1),
            featured_count: config.featured_count.max(1),
        }
    }

    /// Score of one product for the given query tokens
    pub fn score(tokens: &[String], product: &Product) -> u32 {
        let title = product.title.to_lowercase();
        let description = strip_html(&product.description).to_lowercase();

        tokens
            .iter()
            .map(|token| {
                let mut score = 0;
                if title.contains(token.as_str()) {
                    score += TITLE_TOKEN_SCORE;
                }
                if description.contains(token.as_str()) {
                    score += DESCRIPTION_TOKEN_SCORE;
                }
                score
            })
            .sum()
    }

    /// Products sharing at least one query token, best first
    pub fn rank(&self, query: &str, products: &[Product]) -> Vec<ScoredProduct> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(&Product, u32)> = products
            .iter()
            .map(|p| (p, Self::score(&tokens, p)))
            .filter(|(_, score)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(self.top_n);

        tracing::debug!(tokens = ?tokens, matched = scored.len(), "Keyword ranking done");

        scored
            .into_iter()
            .map(|(product, score)| ScoredProduct::keyword(product.clone(), score))
            .collect()
    }

    /// First catalog products, shown unranked when nothing scored
    pub fn featured(&self, products: &[Product]) -> Vec<ScoredProduct> {
        products
            .iter()
            .take(self.featured_count)
            .cloned()
            .map(ScoredProduct::featured)
            .collect()
    }
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("1", "Blue Jeans", 60.0).with_description("Classic denim with a red stitch"),
            Product::new("2", "Red Dress", 80.0).with_description("<b>Elegant</b> red evening dress"),
            Product::new("3", "Wool Scarf", 25.0).with_description("Warm and soft"),
            Product::new("4", "Dress Shoes", 90.0).with_description("Leather shoes"),
        ]
    }

    #[test]
    fn test_title_outweighs_description() {
        let ranker = KeywordRanker::default();
        let ranked = ranker.rank("Show me red dresses", &catalog());
        let ids: Vec<&str> = ranked.iter().map(|s| s.product.id.as_str()).collect();
        // "2": red + dress in title and description = 14; "4": dress in title = 5; "1": red in description = 2
        assert_eq!(ids, vec!["2", "4", "1"]);
        assert_eq!(ranked[0].keyword_score, Some(14));
    }

    #[test]
    fn test_never_returns_zero_scores() {
        let ranker = KeywordRanker::default();
        for query in ["red", "scarf", "dress", "kettle", "the and for"] {
            assert!(ranker.rank(query, &catalog()).iter().all(|s| s.keyword_score.unwrap_or(0) > 0));
        }
        assert!(ranker.rank("kettle", &catalog()).is_empty());
    }

    #[test]
    fn test_top_n_and_featured() {
        let mut config = RankingConfig::default();
        config.keyword_top_n = 1;
        config.featured_count = 3;
        let ranker = KeywordRanker::new(&config);
        assert_eq!(ranker.rank("dress", &catalog()).len(), 1);

        let featured = ranker.featured(&catalog());
        assert_eq!(featured.len(), 3);
        assert_eq!(featured[0].product.id, "1");
        assert_eq!(ranker.featured(&catalog()[..2]).len(), 2);
    }
}
