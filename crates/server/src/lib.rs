//! Storefront Chat Server
//!
//! Provides the HTTP endpoints for the chat widget and shop administration.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use storefront_chat_agent::AgentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Optional service (embeddings, LLM) not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(msg) => ServerError::InvalidRequest(msg),
            AgentError::Configuration(msg) => ServerError::Unavailable(msg),
            AgentError::Upstream(msg) => ServerError::Upstream(msg),
            AgentError::Persistence(e) => ServerError::Persistence(e.to_string()),
            AgentError::Rag(e) => ServerError::Upstream(e.to_string()),
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status()
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Persistence(_) | ServerError::Startup(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
