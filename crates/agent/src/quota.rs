//! Monthly conversation quota
//!
//! The check and the record are separate calls, so two concurrent messages
//! can both pass a check with one conversation left. The overshoot is bounded
//! by request concurrency and accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use storefront_chat_core::{LimitValue, PlanTier};
use storefront_chat_persistence::{BillingPeriod, ConversationUsageRecord, PersistenceError, UsageStore};

/// Usage of one shop in one billing period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub plan: PlanTier,
    pub period: BillingPeriod,
    pub used: u64,
    pub limit: LimitValue,
    /// `None` when unlimited
    pub remaining: Option<u64>,
}

impl QuotaStatus {
    pub fn is_exceeded(&self) -> bool {
        self.limit.is_exhausted(self.used)
    }
}

#[derive(Clone)]
pub struct QuotaChecker {
    usage: Arc<dyn UsageStore>,
}

impl QuotaChecker {
    pub fn new(usage: Arc<dyn UsageStore>) -> Self {
        Self { usage }
    }

    /// Usage in the UTC calendar month containing `at`
    pub async fn status(&self, shop_id: &str, plan: PlanTier, at: DateTime<Utc>) -> Result<QuotaStatus, PersistenceError> {
        let period = BillingPeriod::containing(at);
        let limit = plan.monthly_conversation_limit();
        let used = self.usage.count_in(shop_id, &period).await?;
        Ok(QuotaStatus {
            plan,
            period,
            used,
            limit,
            remaining: limit.remaining(used),
        })
    }

    /// Whether another conversation may be answered
    ///
    /// Unlimited plans skip the count entirely.
    pub async fn allows(&self, shop_id: &str, plan: PlanTier, at: DateTime<Utc>) -> Result<bool, PersistenceError> {
        if plan.is_unlimited() {
            return Ok(true);
        }
        let status = self.status(shop_id, plan, at).await?;
        if status.is_exceeded() {
            tracing::info!(shop = %shop_id, plan = %plan, used = status.used, "Monthly conversation limit reached");
        }
        Ok(!status.is_exceeded())
    }

    /// Bill one conversation event
    pub async fn record(&self, shop_id: &str, session_id: Option<&str>, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        let record = ConversationUsageRecord::new(shop_id, session_id.map(str::to_string)).at(at);
        self.usage.record(&record).await
    }
}
