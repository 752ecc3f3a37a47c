//! Core traits and types for the storefront chat engine
//!
//! This crate provides foundational types used across all other crates:
//! - Catalog product shape and request context
//! - Intent, sentiment and locale enumerations
//! - Outbound response shape (recommendations, quick replies, actions)
//! - Plan tiers and monthly conversation limits
//! - Error taxonomy and per-tier failure type
//! - Secret masking for log output

pub mod context;
pub mod error;
pub mod intent;
pub mod locale;
pub mod masking;
pub mod plan;
pub mod product;
pub mod response;

pub use context::{ChatRequest, PriceRange, RequestContext, ShopPolicies, UserPreferences};
pub use error::{Error, Result, TierFailure};
pub use intent::{ClassificationSource, Intent, Sentiment};
pub use locale::Locale;
pub use masking::{mask_secret, mask_url};
pub use plan::{LimitValue, PlanTier};
pub use product::Product;
pub use response::{
    ActionKind, Badge, ChatResponse, RankedProduct, ResponseAnalytics, ResponseTier,
    SuggestedAction,
};
