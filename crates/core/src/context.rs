//! Inbound request shape and shopper context

use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::product::Product;

/// A shopper message together with the catalog slice it should be answered from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, alias = "message")]
    pub utterance: String,
    #[serde(default)]
    pub products: Vec<Product>,
    pub context: RequestContext,
}

impl ChatRequest {
    pub fn new(utterance: impl Into<String>, context: RequestContext) -> Self {
        Self {
            utterance: utterance.into(),
            products: Vec::new(),
            context,
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }
}

/// Typed request context; `shop_id` and `session_id` are required
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub shop_id: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub session_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub user_preferences: Option<UserPreferences>,
    /// Recently viewed product ids, most recent first
    #[serde(default)]
    pub recent_products: Vec<String>,
    #[serde(default)]
    pub shop_policies: Option<ShopPolicies>,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

impl RequestContext {
    pub fn new(shop_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            locale: default_locale(),
            currency: default_currency(),
            session_id: session_id.into(),
            customer_id: None,
            user_preferences: None,
            recent_products: Vec::new(),
            shop_policies: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Requested locale resolved against the supported set
    pub fn resolved_locale(&self) -> Locale {
        Locale::resolve(&self.locale)
    }

    /// Whether the caller asked the engine to detect the locale
    pub fn wants_locale_detection(&self) -> bool {
        let tag = self.locale.trim();
        tag.is_empty() || tag.eq_ignore_ascii_case("auto")
    }
}

/// Inclusive price bounds; either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, price: f64) -> bool {
        if self.is_open() {
            return false;
        }
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Rolling preference bag of a shopper
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub favorite_colors: Vec<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.favorite_colors.is_empty()
            && self.price_range.map_or(true, |r| r.is_open())
            && self.categories.is_empty()
            && self.styles.is_empty()
            && self.interests.is_empty()
    }

    /// Merge `other` into `self`
    ///
    /// List entries are unioned case-insensitively, keeping existing order.
    /// A price range in `other` replaces the stored one only on the sides it sets.
    pub fn merge(&mut self, other: &UserPreferences) {
        merge_list(&mut self.favorite_colors, &other.favorite_colors);
        merge_list(&mut self.categories, &other.categories);
        merge_list(&mut self.styles, &other.styles);
        merge_list(&mut self.interests, &other.interests);

        if let Some(incoming) = other.price_range {
            let range = self.price_range.get_or_insert_with(PriceRange::default);
            if incoming.min.is_some() {
                range.min = incoming.min;
            }
            if incoming.max.is_some() {
                range.max = incoming.max;
            }
        }
    }
}

fn merge_list(target: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !target.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            target.push(value.to_string());
        }
    }
}

/// Shop policy texts supplied by the policy provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPolicies {
    #[serde(default, alias = "refund")]
    pub returns: Option<String>,
    #[serde(default)]
    pub shipping: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
}

impl ShopPolicies {
    pub fn is_empty(&self) -> bool {
        self.returns.is_none() && self.shipping.is_none() && self.privacy.is_none()
    }
}
