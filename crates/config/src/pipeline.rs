//! Resolution pipeline configuration: workflow dispatch, fallback budget, ranking

use serde::{Deserialize, Serialize};

use crate::constants::{policy, profile, ranking, timeouts};

/// External workflow backend dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Master switch for custom workflow backends
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Timeout of the external call
    #[serde(default = "default_workflow_timeout_ms")]
    pub timeout_ms: u64,

    /// Allow plain `http://` webhook URLs (development only)
    #[serde(default)]
    pub allow_insecure_http: bool,
}

fn default_true() -> bool {
    true
}

fn default_workflow_timeout_ms() -> u64 {
    timeouts::WORKFLOW_MS
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_workflow_timeout_ms(),
            allow_insecure_http: false,
        }
    }
}

/// Fallback pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Time budget for the whole fallback pipeline
    #[serde(default = "default_fallback_budget_ms")]
    pub fallback_budget_ms: u64,

    /// Time budget of the semantic tier; on expiry ranking moves to keywords
    #[serde(default = "default_semantic_budget_ms")]
    pub semantic_budget_ms: u64,

    /// Detect the shopper's language when the request locale is `auto` or empty
    #[serde(default = "default_true")]
    pub detect_locale: bool,

    /// Reuse window for chat sessions
    #[serde(default = "default_session_reuse_secs")]
    pub session_reuse_secs: u64,

    /// Freshness window of cached shop policies
    #[serde(default = "default_policy_freshness_secs")]
    pub policy_freshness_secs: u64,

    /// Enforce monthly conversation quotas
    #[serde(default = "default_true")]
    pub enforce_quota: bool,
}

fn default_fallback_budget_ms() -> u64 {
    timeouts::FALLBACK_BUDGET_MS
}

fn default_semantic_budget_ms() -> u64 {
    timeouts::SEMANTIC_BUDGET_MS
}

fn default_session_reuse_secs() -> u64 {
    profile::SESSION_REUSE_SECS
}

fn default_policy_freshness_secs() -> u64 {
    policy::FRESHNESS_SECS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_budget_ms: default_fallback_budget_ms(),
            semantic_budget_ms: default_semantic_budget_ms(),
            detect_locale: true,
            session_reuse_secs: default_session_reuse_secs(),
            policy_freshness_secs: default_policy_freshness_secs(),
            enforce_quota: true,
        }
    }
}

/// Shortlist sizes and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Use embeddings when an embedding provider is configured
    #[serde(default = "default_true")]
    pub semantic_enabled: bool,

    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,

    #[serde(default = "default_keyword_top_n")]
    pub keyword_top_n: usize,

    #[serde(default = "default_featured_count")]
    pub featured_count: usize,

    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_semantic_top_k() -> usize {
    ranking::SEMANTIC_TOP_K
}

fn default_keyword_top_n() -> usize {
    ranking::KEYWORD_TOP_N
}

fn default_featured_count() -> usize {
    ranking::FEATURED_COUNT
}

fn default_min_similarity() -> f32 {
    ranking::MIN_SIMILARITY
}

fn default_low_stock_threshold() -> i64 {
    ranking::LOW_STOCK_THRESHOLD
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            semantic_enabled: true,
            semantic_top_k: default_semantic_top_k(),
            keyword_top_n: default_keyword_top_n(),
            featured_count: default_featured_count(),
            min_similarity: default_min_similarity(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}
