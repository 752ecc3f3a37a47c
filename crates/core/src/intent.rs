//! Shopper intent and sentiment labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of shopper purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    ProductSearch,
    PriceInquiry,
    Comparison,
    Availability,
    Shipping,
    Returns,
    SizeFit,
    Support,
    Greeting,
    Thanks,
    #[default]
    Other,
}

impl Intent {
    /// Every intent, in the order offered to the LLM classifier
    pub const ALL: [Intent; 11] = [
        Intent::ProductSearch,
        Intent::PriceInquiry,
        Intent::Comparison,
        Intent::Availability,
        Intent::Shipping,
        Intent::Returns,
        Intent::SizeFit,
        Intent::Support,
        Intent::Greeting,
        Intent::Thanks,
        Intent::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ProductSearch => "PRODUCT_SEARCH",
            Intent::PriceInquiry => "PRICE_INQUIRY",
            Intent::Comparison => "COMPARISON",
            Intent::Availability => "AVAILABILITY",
            Intent::Shipping => "SHIPPING",
            Intent::Returns => "RETURNS",
            Intent::SizeFit => "SIZE_FIT",
            Intent::Support => "SUPPORT",
            Intent::Greeting => "GREETING",
            Intent::Thanks => "THANKS",
            Intent::Other => "OTHER",
        }
    }

    /// Parse a label such as `PRICE_INQUIRY`, `price inquiry` or `price-inquiry`
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        Self::ALL.iter().copied().find(|i| i.as_str() == normalized)
    }

    /// Policy-backed support categories
    pub fn is_policy_question(&self) -> bool {
        matches!(self, Intent::Shipping | Intent::Returns)
    }

    /// Intents answered without touching the catalog
    pub fn is_small_talk(&self) -> bool {
        matches!(self, Intent::Greeting | Intent::Thanks)
    }

    /// Intents answered by ranking catalog products
    pub fn wants_products(&self) -> bool {
        !self.is_policy_question() && !self.is_small_talk() && *self != Intent::Support
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classifier tier produced a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Rules,
    Llm,
    Default,
}
