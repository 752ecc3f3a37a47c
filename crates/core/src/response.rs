//! Outbound response shape

use serde::{Deserialize, Serialize};

use crate::intent::{Intent, Sentiment};
use crate::product::Product;

/// Which degradation tier produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTier {
    /// External workflow backend answered
    Workflow,
    /// Embedding-based ranking produced the shortlist
    Semantic,
    /// Shop policy text quoted for a shipping/returns question
    Policy,
    /// Support request acknowledged
    Support,
    /// Greeting or thanks
    SmallTalk,
    /// Token-overlap ranking produced the shortlist
    Keyword,
    /// Nothing ranked; first catalog products shown
    Featured,
    /// Localized generic message without products
    Generic,
    /// Every tier failed
    Apology,
    /// Monthly conversation limit reached
    QuotaExceeded,
}

impl ResponseTier {
    /// Confidence assigned to answers from this tier
    pub fn base_confidence(&self) -> f32 {
        match self {
            Self::Workflow => 0.95,
            Self::Semantic => 0.85,
            Self::Policy => 0.8,
            Self::SmallTalk => 0.75,
            Self::Keyword => 0.7,
            Self::Support => 0.6,
            Self::Featured => 0.45,
            Self::Generic => 0.3,
            Self::Apology => 0.0,
            Self::QuotaExceeded => 1.0,
        }
    }

    /// Wire value of `messageType`
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Semantic => "fallback_semantic",
            Self::Policy => "fallback_policy",
            Self::Support => "fallback_support",
            Self::SmallTalk => "fallback_small_talk",
            Self::Keyword => "fallback_keyword",
            Self::Featured => "fallback_featured",
            Self::Generic => "fallback_generic",
            Self::Apology => "fallback_apology",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }

    /// Label used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Semantic => "semantic",
            Self::Policy => "policy",
            Self::Support => "support",
            Self::SmallTalk => "small_talk",
            Self::Keyword => "keyword",
            Self::Featured => "featured",
            Self::Generic => "generic",
            Self::Apology => "apology",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Workflow | Self::QuotaExceeded)
    }
}

/// Decoration shown on a recommendation card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    BestMatch,
    LowStock,
    SoldOut,
}

/// A product in the response, decorated for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 0-100
    #[serde(default)]
    pub relevance_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(skip)]
    pub inventory: Option<i64>,
}

fn default_available() -> bool {
    true
}

impl RankedProduct {
    pub fn from_product(product: &Product, relevance_score: u8) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            handle: product.handle.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            relevance_score: relevance_score.min(100),
            similarity: None,
            badge: None,
            urgency: None,
            available: product.in_stock(),
            inventory: product.inventory,
        }
    }

    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }
}

/// Kind of follow-up the widget can render as a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ViewProduct,
    CompareProducts,
    BrowseCatalog,
    ViewPolicy,
    ContactSupport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
}

impl SuggestedAction {
    pub fn new(kind: ActionKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAnalytics {
    pub intent_detected: Intent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_intent: Option<String>,
    pub response_time_ms: u64,
}

/// Answer returned to the storefront widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub message_type: String,
    pub recommendations: Vec<RankedProduct>,
    pub quick_replies: Vec<String>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub confidence: f32,
    pub sentiment: Sentiment,
    pub requires_human_escalation: bool,
    pub analytics: ResponseAnalytics,
}

impl ChatResponse {
    /// Response with the tier's message type and confidence and nothing else
    pub fn for_tier(tier: ResponseTier, message: impl Into<String>, intent: Intent) -> Self {
        Self {
            message: message.into(),
            message_type: tier.message_type().to_string(),
            recommendations: Vec::new(),
            quick_replies: Vec::new(),
            suggested_actions: Vec::new(),
            confidence: tier.base_confidence(),
            sentiment: Sentiment::Neutral,
            requires_human_escalation: false,
            analytics: ResponseAnalytics {
                intent_detected: intent,
                sub_intent: None,
                response_time_ms: 0,
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.message_type.starts_with("fallback")
    }

    /// Ids of the recommended products, in display order
    pub fn shown_product_ids(&self) -> Vec<String> {
        self.recommendations.iter().map(|p| p.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_confidence_ordering() {
        let ordered = [
            ResponseTier::Workflow,
            ResponseTier::Semantic,
            ResponseTier::Policy,
            ResponseTier::SmallTalk,
            ResponseTier::Keyword,
            ResponseTier::Featured,
            ResponseTier::Generic,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].base_confidence() > pair[1].base_confidence());
        }
    }

    #[test]
    fn test_fallback_message_types() {
        assert!(!ResponseTier::Workflow.is_fallback());
        assert!(ResponseTier::Keyword.message_type().starts_with("fallback"));
        let resp = ChatResponse::for_tier(ResponseTier::Generic, "hello", Intent::Other);
        assert!(resp.is_fallback());
    }

    #[test]
    fn test_response_wire_shape() {
        let mut resp = ChatResponse::for_tier(ResponseTier::Semantic, "Here", Intent::ProductSearch);
        let product = Product::new("p1", "Red Dress", 49.0);
        let mut ranked = RankedProduct::from_product(&product, 90);
        ranked.badge = Some(Badge::BestMatch);
        resp.recommendations.push(ranked);
        resp.suggested_actions
            .push(SuggestedAction::new(ActionKind::CompareProducts, "Compare"));

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["messageType"], "fallback_semantic");
        assert_eq!(value["analytics"]["intentDetected"], "PRODUCT_SEARCH");
        assert_eq!(value["recommendations"][0]["relevanceScore"], 90);
        assert_eq!(value["recommendations"][0]["badge"], "best_match");
        assert_eq!(value["suggestedActions"][0]["type"], "compare_products");
        assert_eq!(value["requiresHumanEscalation"], false);
    }
}
