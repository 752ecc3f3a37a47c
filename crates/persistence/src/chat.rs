//! Chat sessions and their append-only message log

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use uuid::Uuid;

use storefront_chat_core::{Intent, Sentiment};

/// A run of messages belonging to one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub chat_session_id: Uuid,
    pub shop_id: String,
    pub profile_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(shop_id: impl Into<String>, profile_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            chat_session_id: Uuid::new_v4(),
            shop_id: shop_id.into(),
            profile_id,
            started_at: now,
            last_activity: now,
        }
    }

    /// Whether the session is still within the reuse window at `now`
    pub fn is_reusable(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.last_activity) < window
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for ChatRole {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "assistant" => Self::Assistant,
            _ => Self::User,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: Uuid,
    pub chat_session_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub intent: Option<Intent>,
    pub sentiment: Option<Sentiment>,
    pub confidence: Option<f32>,
    pub products_shown: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(chat_session_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(chat_session_id, ChatRole::User, content)
    }

    pub fn assistant(chat_session_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(chat_session_id, ChatRole::Assistant, content)
    }

    fn new(chat_session_id: Uuid, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            chat_session_id,
            role,
            content: content.into(),
            intent: None,
            sentiment: None,
            confidence: None,
            products_shown: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_labels(mut self, intent: Intent, sentiment: Sentiment) -> Self {
        self.intent = Some(intent);
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_products(mut self, products: Vec<String>) -> Self {
        self.products_shown = products;
        self
    }
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Most recently active session of a profile
    async fn latest_session(
        &self,
        shop_id: &str,
        profile_id: Uuid,
    ) -> Result<Option<ChatSession>, PersistenceError>;

    async fn save_session(&self, session: &ChatSession) -> Result<(), PersistenceError>;

    async fn append_message(&self, message: &ChatMessage) -> Result<(), PersistenceError>;

    /// Messages of a session in chronological order
    async fn messages(&self, chat_session_id: Uuid) -> Result<Vec<ChatMessage>, PersistenceError>;
}

#[derive(Clone)]
pub struct ScyllaChatStore {
    client: ScyllaClient,
}

impl ScyllaChatStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatStore for ScyllaChatStore {
    async fn latest_session(
        &self,
        shop_id: &str,
        profile_id: Uuid,
    ) -> Result<Option<ChatSession>, PersistenceError> {
        let query = format!(
            "SELECT chat_session_id, started_at, last_activity
             FROM {}.chat_sessions WHERE shop_id = ? AND profile_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (shop_id, profile_id))
            .await?;

        let mut latest: Option<ChatSession> = None;
        if let Some(rows) = result.rows {
            for row in rows {
                let (chat_session_id, started_at, last_activity): (Uuid, i64, i64) = row.into_typed()?;
                let session = ChatSession {
                    chat_session_id,
                    shop_id: shop_id.to_string(),
                    profile_id,
                    started_at: DateTime::from_timestamp_millis(started_at).unwrap_or_else(Utc::now),
                    last_activity: DateTime::from_timestamp_millis(last_activity).unwrap_or_else(Utc::now),
                };
                if latest.as_ref().map_or(true, |l| session.last_activity > l.last_activity) {
                    latest = Some(session);
                }
            }
        }
        Ok(latest)
    }

    async fn save_session(&self, session: &ChatSession) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.chat_sessions (
                shop_id, profile_id, chat_session_id, started_at, last_activity
            ) VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &session.shop_id,
                    session.profile_id,
                    session.chat_session_id,
                    session.started_at.timestamp_millis(),
                    session.last_activity.timestamp_millis(),
                ),
            )
            .await?;
        Ok(())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.chat_messages (
                chat_session_id, created_at, message_id, role, content,
                intent, sentiment, confidence, products_shown
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    message.chat_session_id,
                    message.created_at.timestamp_millis(),
                    message.message_id,
                    message.role.as_str(),
                    &message.content,
                    message.intent.map(|i| i.as_str()),
                    message.sentiment.map(|s| s.as_str()),
                    message.confidence,
                    &message.products_shown,
                ),
            )
            .await?;
        Ok(())
    }

    async fn messages(&self, chat_session_id: Uuid) -> Result<Vec<ChatMessage>, PersistenceError> {
        let query = format!(
            "SELECT chat_session_id, created_at, message_id, role, content,
                    intent, sentiment, confidence, products_shown
             FROM {}.chat_messages WHERE chat_session_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (chat_session_id,))
            .await?;

        let mut messages = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (chat_session_id, created_at, message_id, role, content, intent, sentiment, confidence, products): (
                    Uuid,
                    i64,
                    Uuid,
                    String,
                    String,
                    Option<String>,
                    Option<String>,
                    Option<f32>,
                    Option<Vec<String>>,
                ) = row.into_typed()?;

                messages.push(ChatMessage {
                    message_id,
                    chat_session_id,
                    role: role.parse().unwrap_or(ChatRole::User),
                    content,
                    intent: intent.as_deref().and_then(Intent::from_label),
                    sentiment: sentiment.as_deref().and_then(Sentiment::from_label),
                    confidence,
                    products_shown: products.unwrap_or_default(),
                    created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
                });
            }
        }
        Ok(messages)
    }
}
