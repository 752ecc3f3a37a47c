//! Shopper profile and chat session tracking

use chrono::Utc;
use std::sync::Arc;

use storefront_chat_core::{ChatResponse, Intent, RequestContext, Sentiment};
use storefront_chat_persistence::{
    ChatMessage, ChatSession, ChatStore, Interaction, InteractionKind, PersistenceError, ProfileStore,
    UserProfile,
};
use storefront_chat_rag::PersonalizationSignals;

/// Profile and session a message belongs to
#[derive(Debug, Clone)]
pub struct Conversation {
    pub profile: UserProfile,
    pub session: ChatSession,
}

impl Conversation {
    /// Personalization inputs; ids reported with the request come first
    pub fn signals(&self, reported_recent: &[String]) -> PersonalizationSignals {
        PersonalizationSignals::from_profile(
            &self.profile.preferences,
            self.profile.recent_products(reported_recent),
        )
    }
}

pub struct ConversationTracker {
    profiles: Arc<dyn ProfileStore>,
    chat: Arc<dyn ChatStore>,
    reuse_window: chrono::Duration,
}

impl ConversationTracker {
    pub fn new(profiles: Arc<dyn ProfileStore>, chat: Arc<dyn ChatStore>, reuse_window: std::time::Duration) -> Self {
        Self {
            profiles,
            chat,
            reuse_window: chrono::Duration::from_std(reuse_window).unwrap_or_else(|_| chrono::Duration::hours(1)),
        }
    }

    /// Load or create the profile, fold in request signals and pick the session
    ///
    /// A session idle for longer than the reuse window is replaced by a new one.
    pub async fn begin(&self, context: &RequestContext) -> Result<Conversation, PersistenceError> {
        let mut profile = match self.profiles.get(&context.shop_id, &context.session_id).await? {
            Some(profile) => profile,
            None => {
                tracing::debug!(shop = %context.shop_id, "Creating shopper profile");
                UserProfile::new(&context.shop_id, &context.session_id)
            }
        };

        if let Some(customer_id) = context.customer_id.as_ref().filter(|c| !c.is_empty()) {
            profile.customer_id = Some(customer_id.clone());
        }
        if let Some(preferences) = &context.user_preferences {
            profile.merge_preferences(preferences);
        }
        // Oldest first so the most recent ends up at the front
        for product_id in context.recent_products.iter().rev() {
            profile.record_view(product_id);
        }

        let now = Utc::now();
        let session = match self.chat.latest_session(&context.shop_id, profile.profile_id).await? {
            Some(session) if session.is_reusable(now, self.reuse_window) => session,
            _ => ChatSession::new(&context.shop_id, profile.profile_id),
        };

        Ok(Conversation { profile, session })
    }

    /// Persist one exchange: both messages, the session touch and the profile
    pub async fn record_exchange(
        &self,
        conversation: &mut Conversation,
        utterance: &str,
        response: &ChatResponse,
    ) -> Result<(), PersistenceError> {
        let session_id = conversation.session.chat_session_id;
        let intent: Intent = response.analytics.intent_detected;
        let sentiment: Sentiment = response.sentiment;

        let user = ChatMessage::user(session_id, utterance).with_labels(intent, sentiment);
        let assistant = ChatMessage::assistant(session_id, &response.message)
            .with_confidence(response.confidence)
            .with_products(response.shown_product_ids());

        self.chat.append_message(&user).await?;
        self.chat.append_message(&assistant).await?;

        conversation.session.last_activity = Utc::now();
        self.chat.save_session(&conversation.session).await?;

        conversation.profile.record_interaction(Interaction::message(intent));
        self.profiles.upsert(&conversation.profile).await
    }

    /// Record a product click on the shopper's profile
    pub async fn record_click(&self, shop_id: &str, session_id: &str, product_id: &str) -> Result<(), PersistenceError> {
        let mut profile = self
            .profiles
            .get(shop_id, session_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(shop_id, session_id));
        profile.record_view(product_id);
        profile.record_interaction(Interaction::product(InteractionKind::ProductClick, product_id));
        self.profiles.upsert(&profile).await
    }
}
