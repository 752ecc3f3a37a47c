//! Storefront chat resolution engine
//!
//! Features:
//! - External workflow dispatch with an explicit fallback state machine
//! - Built-in pipeline: classification, semantic/keyword/featured ranking,
//!   personalization
//! - Localized composition for en, fr, es, de, it, pt, ja and zh
//! - Shop policy cache with stale fallback
//! - Shopper profile and chat session tracking
//! - Daily analytics and monthly conversation quotas

pub mod analytics;
pub mod assistant;
pub mod composer;
pub mod messages;
pub mod pipeline;
pub mod policy;
pub mod quota;
pub mod session;
pub mod workflow;

pub use analytics::UsageAggregator;
pub use assistant::{AssistantServices, StorefrontAssistant};
pub use composer::ResponseComposer;
pub use messages::{table as message_table, MessageTable};
pub use pipeline::{FallbackPipeline, PipelineInput};
pub use policy::{policy_preview, PolicyCache, PolicySource, StoredPolicySource};
pub use quota::{QuotaChecker, QuotaStatus};
pub use session::{Conversation, ConversationTracker};
pub use workflow::{
    DispatchOutcome, DispatchRoute, DispatchState, HttpWorkflowBackend, WorkflowBackend,
    WorkflowDispatcher, WorkflowReply, WorkflowTarget,
};

use thiserror::Error;

use storefront_chat_persistence::PersistenceError;
use storefront_chat_rag::RagError;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Retrieval error: {0}")]
    Rag(#[from] RagError),
}

impl AgentError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AgentError::Validation(_))
    }
}

impl From<AgentError> for storefront_chat_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(msg) => storefront_chat_core::Error::Validation(msg),
            AgentError::Configuration(msg) => storefront_chat_core::Error::Configuration(msg),
            AgentError::Upstream(msg) => storefront_chat_core::Error::Upstream(msg),
            AgentError::Persistence(e) => e.into(),
            AgentError::Rag(e) => e.into(),
        }
    }
}
