//! Prometheus metrics
//!
//! The engine records through the `metrics` facade; this module installs the
//! Prometheus recorder and renders it at `/metrics`.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

/// Response-time buckets in milliseconds
const RESPONSE_MS_BUCKETS: &[f64] = &[25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0];

/// Install the global Prometheus recorder
///
/// Fails if a recorder is already installed (e.g. a second call in tests).
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("storefront_chat_response_ms".to_string()),
            RESPONSE_MS_BUCKETS,
        )
        .map_err(|e| ServerError::Startup(format!("metrics buckets: {}", e)))?
        .install_recorder()
        .map_err(|e| ServerError::Startup(format!("metrics recorder: {}", e)))?;

    metrics::describe_counter!("storefront_chat_requests_total", "Shopper messages received");
    metrics::describe_counter!("storefront_chat_tier_total", "Responses by resolution tier");
    metrics::describe_histogram!(
        "storefront_chat_response_ms",
        metrics::Unit::Milliseconds,
        "End-to-end resolution time"
    );
    metrics::describe_counter!("storefront_chat_embedding_generated_total", "Product embeddings generated");

    Ok(handle)
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics disabled".to_string(),
        ),
    }
}
