//! Re-weights a shortlist with the shopper's preference profile
//!
//! Boosts are additive on the 0-100 relevance scale and never subtract, so
//! adding a signal can only keep or raise a product's score.

use serde::{Deserialize, Serialize};

use storefront_chat_config::constants::personalization::{
    FAVORITE_COLOR_BOOST, MAX_RELEVANCE, PRICE_RANGE_BOOST, RECENTLY_VIEWED_BOOST,
};
use storefront_chat_core::{PriceRange, Product, UserPreferences};

use crate::scored::{sort_by_relevance, ScoredProduct};

/// Preference signals for one shopper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationSignals {
    pub recent_products: Vec<String>,
    pub price_range: Option<PriceRange>,
    pub favorite_colors: Vec<String>,
}

impl PersonalizationSignals {
    pub fn from_profile(preferences: &UserPreferences, recent_products: Vec<String>) -> Self {
        Self {
            recent_products,
            price_range: preferences.price_range,
            favorite_colors: preferences.favorite_colors.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recent_products.is_empty()
            && self.price_range.map_or(true, |r| r.is_open())
            && self.favorite_colors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonalizationScorer;

impl PersonalizationScorer {
    pub fn new() -> Self {
        Self
    }

    /// Boost earned by a product from the given signals
    pub fn boost(&self, product: &Product, signals: &PersonalizationSignals) -> u32 {
        let mut boost = 0;

        if signals.recent_products.iter().any(|id| *id == product.id) {
            boost += RECENTLY_VIEWED_BOOST;
        }

        if let Some(range) = signals.price_range {
            if range.contains(product.price) {
                boost += PRICE_RANGE_BOOST;
            }
        }

        let description = product.description.to_lowercase();
        for color in &signals.favorite_colors {
            let color = color.trim().to_lowercase();
            if !color.is_empty() && description.contains(&color) {
                boost += FAVORITE_COLOR_BOOST;
            }
        }

        boost
    }

    /// Apply boosts, clamp to 100 and re-sort (stable)
    pub fn apply(&self, mut items: Vec<ScoredProduct>, signals: &PersonalizationSignals) -> Vec<ScoredProduct> {
        if signals.is_empty() {
            return items;
        }

        for item in &mut items {
            let boosted = (u32::from(item.relevance) + self.boost(&item.product, signals)).min(MAX_RELEVANCE);
            item.relevance = boosted as u8;
        }
        sort_by_relevance(&mut items);
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortlist() -> Vec<ScoredProduct> {
        vec![
            ScoredProduct::semantic(Product::new("a", "Jacket", 150.0).with_description("Black leather"), 0.60),
            ScoredProduct::semantic(Product::new("b", "Dress", 45.0).with_description("Bright RED cotton"), 0.55),
            ScoredProduct::semantic(Product::new("c", "Scarf", 20.0).with_description("Grey wool"), 0.97),
        ]
    }

    #[test]
    fn test_boosts_reorder_shortlist() {
        let signals = PersonalizationSignals {
            recent_products: vec!["b".to_string()],
            price_range: Some(PriceRange::new(Some(30.0), Some(60.0))),
            favorite_colors: vec!["Red".to_string()],
        };
        let ranked = PersonalizationScorer::new().apply(shortlist(), &signals);

        // b: 55 + 10 + 5 + 3 = 73 overtakes a (60); c stays first and is capped
        let ids: Vec<&str> = ranked.iter().map(|s| s.product.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(ranked[1].relevance, 73);
        assert!(ranked.iter().all(|s| s.relevance <= 100));
    }

    #[test]
    fn test_clamped_at_max() {
        let signals = PersonalizationSignals {
            recent_products: vec!["c".to_string()],
            price_range: Some(PriceRange::new(None, Some(30.0))),
            favorite_colors: vec!["grey".to_string()],
        };
        let ranked = PersonalizationScorer::new().apply(shortlist(), &signals);
        assert_eq!(ranked[0].product.id, "c");
        assert_eq!(ranked[0].relevance, 100);
    }

    #[test]
    fn test_adding_signals_never_lowers_scores() {
        let scorer = PersonalizationScorer::new();
        let mut signals = PersonalizationSignals::default();
        let mut previous: Vec<(String, u8)> = shortlist().iter().map(|s| (s.product.id.clone(), s.relevance)).collect();

        let steps: Vec<Box<dyn Fn(&mut PersonalizationSignals)>> = vec![
            Box::new(|s| s.favorite_colors.push("black".to_string())),
            Box::new(|s| s.price_range = Some(PriceRange::new(Some(100.0), None))),
            Box::new(|s| s.recent_products.push("a".to_string())),
        ];

        for step in steps {
            step(&mut signals);
            let ranked = scorer.apply(shortlist(), &signals);
            for (id, before) in &previous {
                let now = ranked.iter().find(|s| &s.product.id == id).unwrap().relevance;
                assert!(now >= *before, "{} dropped from {} to {}", id, before, now);
            }
            previous = ranked.iter().map(|s| (s.product.id.clone(), s.relevance)).collect();
        }
    }

    #[test]
    fn test_deterministic() {
        let signals = PersonalizationSignals {
            favorite_colors: vec!["red".to_string()],
            ..Default::default()
        };
        let scorer = PersonalizationScorer::new();
        assert_eq!(scorer.apply(shortlist(), &signals), scorer.apply(shortlist(), &signals));
    }
}
