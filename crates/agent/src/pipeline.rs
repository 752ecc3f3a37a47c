//! Built-in fallback pipeline
//!
//! classify → (policy | support | small talk) or
//! semantic ranking → keyword ranking → featured → personalization → compose
//!
//! The semantic tier runs under its own budget; on expiry ranking continues
//! with keywords.

use std::time::Duration;

use storefront_chat_config::constants::timeouts::SEMANTIC_BUDGET_MS;
use storefront_chat_core::{ChatResponse, Intent, Locale, PriceRange, Product, ShopPolicies, TierFailure};
use storefront_chat_rag::{
    KeywordRanker, PersonalizationScorer, PersonalizationSignals, RankingSource, ScoredProduct,
    SemanticRanker,
};
use storefront_chat_text_processing::{describe_price_range, extract_price_constraint, Classification, IntentClassifier};

use crate::composer::ResponseComposer;

/// Everything one pipeline run needs from the request
#[derive(Debug, Clone, Copy)]
pub struct PipelineInput<'a> {
    pub shop_id: &'a str,
    pub utterance: &'a str,
    pub products: &'a [Product],
    pub locale: Locale,
    pub policies: &'a ShopPolicies,
    pub signals: &'a PersonalizationSignals,
}

#[derive(Clone)]
pub struct FallbackPipeline {
    classifier: IntentClassifier,
    semantic: Option<SemanticRanker>,
    semantic_budget: Duration,
    keyword: KeywordRanker,
    personalization: PersonalizationScorer,
    composer: ResponseComposer,
}

impl FallbackPipeline {
    pub fn new(
        classifier: IntentClassifier,
        semantic: Option<SemanticRanker>,
        keyword: KeywordRanker,
        composer: ResponseComposer,
    ) -> Self {
        Self {
            classifier,
            semantic,
            semantic_budget: Duration::from_millis(SEMANTIC_BUDGET_MS),
            keyword,
            personalization: PersonalizationScorer::new(),
            composer,
        }
    }

    pub fn with_semantic_budget(mut self, budget: Duration) -> Self {
        self.semantic_budget = budget;
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub async fn run(&self, input: PipelineInput<'_>) -> ChatResponse {
        let classification = self.classifier.classify(input.utterance, Some(input.locale)).await;
        let price = extract_price_constraint(input.utterance);

        let mut response = self.answer(&input, &classification, price).await;
        response.sentiment = classification.sentiment;
        response.analytics.intent_detected = classification.intent;
        if let Some(range) = price.filter(|_| classification.intent.wants_products()) {
            response.analytics.sub_intent = Some(describe_price_range(&range));
        }
        response
    }

    async fn answer(
        &self,
        input: &PipelineInput<'_>,
        classification: &Classification,
        price: Option<PriceRange>,
    ) -> ChatResponse {
        let intent = classification.intent;

        if intent.is_small_talk() {
            return self.composer.small_talk(input.locale, intent);
        }
        if intent.is_policy_question() {
            return self.composer.policy(input.locale, intent, input.policies);
        }
        if intent == Intent::Support {
            return self.composer.support(input.locale, classification.sentiment);
        }
        if input.products.is_empty() {
            return self.composer.no_product_data(input.locale, intent);
        }

        let candidates = narrow_by_price(input.products, price);
        let (source, items) = self.shortlist(input, &candidates).await;
        let items = match source {
            RankingSource::Featured => items,
            _ => self.personalization.apply(items, input.signals),
        };
        self.composer.products(input.locale, intent, source, items)
    }

    /// Semantic, then keyword, then featured
    async fn shortlist(&self, input: &PipelineInput<'_>, candidates: &[Product]) -> (RankingSource, Vec<ScoredProduct>) {
        let semantic = match &self.semantic {
            Some(ranker) => {
                match tokio::time::timeout(self.semantic_budget, ranker.rank(input.shop_id, input.utterance, candidates))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(TierFailure::Timeout(self.semantic_budget)),
                }
            }
            None => Err(TierFailure::NotConfigured("no embedding provider".to_string())),
        };

        match semantic {
            Ok(items) => return (RankingSource::Semantic, items),
            Err(TierFailure::NotConfigured(_)) | Err(TierFailure::Empty) => {}
            Err(failure) => {
                tracing::warn!(shop = %input.shop_id, reason = failure.label(), error = %failure, "Semantic ranking failed");
            }
        }

        let items = self.keyword.rank(input.utterance, candidates);
        if !items.is_empty() {
            return (RankingSource::Keyword, items);
        }

        tracing::debug!(shop = %input.shop_id, "Nothing scored, showing featured products");
        (RankingSource::Featured, self.keyword.featured(candidates))
    }
}

/// Products inside the price constraint, or all of them when none qualify
fn narrow_by_price(products: &[Product], price: Option<PriceRange>) -> Vec<Product> {
    if let Some(range) = price.filter(|r| !r.is_open()) {
        let narrowed: Vec<Product> = products.iter().filter(|p| range.contains(p.price)).cloned().collect();
        if !narrowed.is_empty() {
            return narrowed;
        }
    }
    products.to_vec()
}
