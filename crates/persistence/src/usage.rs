//! Billed conversation events and UTC calendar-month billing periods

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Half-open UTC month window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingPeriod {
    /// The calendar month containing `at`
    pub fn containing(at: DateTime<Utc>) -> Self {
        let (year, month) = (at.year(), at.month());
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        Self {
            start: month_start(year, month),
            end: month_start(next_year, next_month),
        }
    }

    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    /// Partition key, e.g. `2024-03`
    pub fn key(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// One billed conversation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUsageRecord {
    pub usage_id: Uuid,
    pub shop_id: String,
    pub session_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationUsageRecord {
    pub fn new(shop_id: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            usage_id: Uuid::new_v4(),
            shop_id: shop_id.into(),
            session_id,
            recorded_at: Utc::now(),
        }
    }

    pub fn at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn record(&self, record: &ConversationUsageRecord) -> Result<(), PersistenceError>;

    /// Events of a shop inside `period`
    async fn count_in(&self, shop_id: &str, period: &BillingPeriod) -> Result<u64, PersistenceError>;
}

#[derive(Clone)]
pub struct ScyllaUsageStore {
    client: ScyllaClient,
}

impl ScyllaUsageStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageStore for ScyllaUsageStore {
    async fn record(&self, record: &ConversationUsageRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.conversation_usage (
                shop_id, period, recorded_at, usage_id, session_id
            ) VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let period = BillingPeriod::containing(record.recorded_at).key();
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &record.shop_id,
                    period,
                    record.recorded_at.timestamp_millis(),
                    record.usage_id,
                    &record.session_id,
                ),
            )
            .await?;
        Ok(())
    }

    async fn count_in(&self, shop_id: &str, period: &BillingPeriod) -> Result<u64, PersistenceError> {
        let query = format!(
            "SELECT COUNT(*) FROM {}.conversation_usage
             WHERE shop_id = ? AND period = ? AND recorded_at >= ? AND recorded_at < ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(
                query,
                (
                    shop_id,
                    period.key(),
                    period.start.timestamp_millis(),
                    period.end.timestamp_millis(),
                ),
            )
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (count,): (i64,) = row.into_typed()?;
                return Ok(count.max(0) as u64);
            }
        }
        Ok(0)
    }
}
