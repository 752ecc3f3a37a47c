//! Turns a tier outcome into a localized shopper-facing response

use storefront_chat_config::RankingConfig;
use storefront_chat_core::{
    ActionKind, Badge, ChatResponse, Intent, Locale, RankedProduct, ResponseTier, Sentiment,
    ShopPolicies, SuggestedAction,
};
use storefront_chat_rag::{RankingSource, ScoredProduct};

use crate::messages::{table, MessageTable};
use crate::policy::policy_preview;

/// Builds [`ChatResponse`]s from fixed per-locale templates
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    low_stock_threshold: i64,
}

impl ResponseComposer {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            low_stock_threshold: config.low_stock_threshold,
        }
    }

    /// Greeting or thanks
    pub fn small_talk(&self, locale: Locale, intent: Intent) -> ChatResponse {
        let t = table(locale);
        let message = if intent == Intent::Thanks { t.thanks } else { t.greeting };
        let mut response = ChatResponse::for_tier(ResponseTier::SmallTalk, message, intent);
        decorate(&mut response, t, false);
        response
    }

    /// Shipping or returns question
    ///
    /// Quotes the shop's own policy when it has enough text, otherwise answers
    /// with a generic localized message. Never talks about product
    /// availability.
    pub fn policy(&self, locale: Locale, intent: Intent, policies: &ShopPolicies) -> ChatResponse {
        let t = table(locale);
        let label = if intent == Intent::Returns { t.returns_label } else { t.shipping_label };

        let mut response = match policy_preview(intent, policies) {
            Some(quoted) => ChatResponse::for_tier(ResponseTier::Policy, format!("{}\n\n{}", label, quoted), intent),
            None => {
                let generic = if intent == Intent::Returns { t.returns_generic } else { t.shipping_generic };
                ChatResponse::for_tier(ResponseTier::Support, generic, intent)
            }
        };
        decorate(&mut response, t, false);
        response
            .suggested_actions
            .insert(0, SuggestedAction::new(ActionKind::ViewPolicy, t.action_view_policy));
        response
    }

    /// Support request; negative sentiment asks for a human
    pub fn support(&self, locale: Locale, sentiment: Sentiment) -> ChatResponse {
        let t = table(locale);
        let escalate = sentiment == Sentiment::Negative;
        let message = if escalate { t.support_escalation } else { t.support };

        let mut response = ChatResponse::for_tier(ResponseTier::Support, message, Intent::Support);
        response.requires_human_escalation = escalate;
        decorate(&mut response, t, false);
        response
            .suggested_actions
            .insert(0, SuggestedAction::new(ActionKind::ContactSupport, t.action_contact));
        response
    }

    /// Ranked or featured shortlist
    pub fn products(
        &self,
        locale: Locale,
        intent: Intent,
        source: RankingSource,
        items: Vec<ScoredProduct>,
    ) -> ChatResponse {
        let t = table(locale);
        let tier = match source {
            RankingSource::Semantic => ResponseTier::Semantic,
            RankingSource::Keyword => ResponseTier::Keyword,
            RankingSource::Featured => ResponseTier::Featured,
        };
        let message = if source == RankingSource::Featured { t.featured } else { t.matches };

        let mut response = ChatResponse::for_tier(tier, message, intent);
        response.recommendations = items
            .iter()
            .enumerate()
            .map(|(rank, item)| self.ranked(t, item, rank == 0 && source != RankingSource::Featured))
            .collect();
        let has_products = !response.recommendations.is_empty();
        decorate(&mut response, t, has_products);
        response
    }

    /// Product question against an empty catalog
    pub fn no_product_data(&self, locale: Locale, intent: Intent) -> ChatResponse {
        let t = table(locale);
        let mut response = ChatResponse::for_tier(ResponseTier::Generic, t.no_product_data, intent);
        decorate(&mut response, t, false);
        response
    }

    /// Every tier failed
    pub fn apology(locale: Locale, intent: Intent) -> ChatResponse {
        ChatResponse::for_tier(ResponseTier::Apology, table(locale).apology, intent)
    }

    /// Monthly conversation limit reached
    pub fn quota_exceeded(locale: Locale) -> ChatResponse {
        let t = table(locale);
        let mut response = ChatResponse::for_tier(ResponseTier::QuotaExceeded, t.quota_exceeded, Intent::Other);
        response
            .suggested_actions
            .push(SuggestedAction::new(ActionKind::BrowseCatalog, t.action_browse));
        response
    }

    fn ranked(&self, t: &MessageTable, item: &ScoredProduct, best: bool) -> RankedProduct {
        let mut ranked = RankedProduct::from_product(&item.product, item.relevance);
        if let Some(similarity) = item.similarity {
            ranked = ranked.with_similarity(similarity);
        }

        if !item.product.in_stock() {
            ranked.badge = Some(Badge::SoldOut);
        } else if let Some(count) = item.product.inventory.filter(|n| *n <= self.low_stock_threshold) {
            ranked.badge = Some(Badge::LowStock);
            ranked.urgency = Some(t.low_stock_line(count));
        } else if best {
            ranked.badge = Some(Badge::BestMatch);
        }
        ranked
    }
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

/// Quick replies and actions, conditioned only on whether products are shown
fn decorate(response: &mut ChatResponse, t: &MessageTable, has_products: bool) {
    if has_products {
        response.quick_replies = t.quick_replies_products.iter().map(|s| s.to_string()).collect();
        response.suggested_actions = vec![
            SuggestedAction::new(ActionKind::ViewProduct, t.action_view_product),
            SuggestedAction::new(ActionKind::CompareProducts, t.action_compare),
        ];
    } else {
        response.quick_replies = t.quick_replies_browse.iter().map(|s| s.to_string()).collect();
        response.suggested_actions = vec![SuggestedAction::new(ActionKind::BrowseCatalog, t.action_browse)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_chat_core::Product;

    fn composer() -> ResponseComposer {
        ResponseComposer::default()
    }

    #[test]
    fn test_badges() {
        let items = vec![
            ScoredProduct::semantic(Product::new("a", "Red Dress", 49.0).with_inventory(40), 0.9),
            ScoredProduct::semantic(Product::new("b", "Red Skirt", 39.0).with_inventory(2), 0.7),
            ScoredProduct::semantic(Product::new("c", "Red Top", 29.0).with_inventory(0), 0.6),
            ScoredProduct::semantic(Product::new("d", "Red Hat", 19.0), 0.5),
        ];
        let response = composer().products(Locale::En, Intent::ProductSearch, RankingSource::Semantic, items);

        let badges: Vec<Option<Badge>> = response.recommendations.iter().map(|r| r.badge).collect();
        assert_eq!(badges, vec![Some(Badge::BestMatch), Some(Badge::LowStock), Some(Badge::SoldOut), None]);
        assert_eq!(response.recommendations[1].urgency.as_deref(), Some("Only 2 left in stock!"));
        assert_eq!(response.recommendations[0].relevance_score, 90);
        assert_eq!(response.message_type, "fallback_semantic");
        assert_eq!(response.confidence, 0.85);
        assert_eq!(response.quick_replies.len(), 3);
        assert_eq!(response.suggested_actions[0].kind, ActionKind::ViewProduct);
    }

    #[test]
    fn test_featured_has_no_best_match() {
        let items = vec![ScoredProduct::featured(Product::new("a", "Mug", 12.0))];
        let response = composer().products(Locale::Fr, Intent::ProductSearch, RankingSource::Featured, items);
        assert_eq!(response.recommendations[0].badge, None);
        assert_eq!(response.message, table(Locale::Fr).featured);
        assert_eq!(response.confidence, 0.45);
    }

    #[test]
    fn test_policy_quoted_or_generic() {
        let policies = ShopPolicies {
            shipping: Some("We ship worldwide within 3-5 business days. Orders over $50 ship free.".into()),
            returns: Some("No returns.".into()),
            privacy: None,
        };

        let shipping = composer().policy(Locale::En, Intent::Shipping, &policies);
        assert!(shipping.message.starts_with("Here's our shipping policy:"));
        assert!(shipping.message.contains("ship worldwide"));
        assert_eq!(shipping.message_type, "fallback_policy");

        let returns = composer().policy(Locale::De, Intent::Returns, &policies);
        assert_eq!(returns.message, table(Locale::De).returns_generic);
        assert!(returns.recommendations.is_empty());
    }

    #[test]
    fn test_support_escalates_on_negative() {
        let calm = composer().support(Locale::En, Sentiment::Neutral);
        assert!(!calm.requires_human_escalation);

        let upset = composer().support(Locale::Es, Sentiment::Negative);
        assert!(upset.requires_human_escalation);
        assert_eq!(upset.message, table(Locale::Es).support_escalation);
        assert_eq!(upset.suggested_actions[0].kind, ActionKind::ContactSupport);
        assert!(!upset.message.to_lowercase().contains("no product"));
    }

    #[test]
    fn test_no_product_data() {
        let response = composer().no_product_data(Locale::En, Intent::ProductSearch);
        assert_eq!(response.message_type, "fallback_generic");
        assert!(response.recommendations.is_empty());
        assert_eq!(response.quick_replies, table(Locale::En).quick_replies_browse.to_vec());
    }
}
