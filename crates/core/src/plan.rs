//! Billing plan tiers and their monthly conversation limits

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A usage limit that may be unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitValue {
    Limited(u64),
    Unlimited,
}

impl LimitValue {
    /// Whether `used` has reached the limit
    pub fn is_exhausted(&self, used: u64) -> bool {
        match self {
            LimitValue::Limited(max) => used >= *max,
            LimitValue::Unlimited => false,
        }
    }

    /// Remaining allowance, `None` when unlimited
    pub fn remaining(&self, used: u64) -> Option<u64> {
        match self {
            LimitValue::Limited(max) => Some(max.saturating_sub(used)),
            LimitValue::Unlimited => None,
        }
    }
}

/// Subscription plan of a shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    #[default]
    Free,
    Starter,
    Growth,
    Professional,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Starter => "STARTER",
            Self::Growth => "GROWTH",
            Self::Professional => "PROFESSIONAL",
            Self::Enterprise => "ENTERPRISE",
        }
    }

    /// Conversations allowed per UTC calendar month
    pub fn monthly_conversation_limit(&self) -> LimitValue {
        match self {
            Self::Free => LimitValue::Limited(50),
            Self::Starter => LimitValue::Limited(500),
            Self::Growth => LimitValue::Limited(2_500),
            Self::Professional => LimitValue::Limited(10_000),
            Self::Enterprise => LimitValue::Unlimited,
        }
    }

    /// Unlimited tiers skip the quota comparison entirely
    pub fn is_unlimited(&self) -> bool {
        matches!(self.monthly_conversation_limit(), LimitValue::Unlimited)
    }
}

/// Unknown identifiers map to the free tier
impl FromStr for PlanTier {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "STARTER" => Self::Starter,
            "GROWTH" => Self::Growth,
            "PROFESSIONAL" | "PRO" => Self::Professional,
            "ENTERPRISE" | "UNLIMITED" => Self::Enterprise,
            _ => Self::Free,
        })
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
