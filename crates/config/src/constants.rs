//! Centralized constants for the storefront chat engine
//!
//! Single source of truth for limits, scoring weights and default values.
//! Settings defaults refer back to these instead of repeating literals.

/// Shopper profile and session bounds
pub mod profile {
    /// Browsing history entries kept per profile, most recent first
    pub const HISTORY_CAP: usize = 50;

    /// Interaction log entries kept per profile
    pub const INTERACTIONS_CAP: usize = 100;

    /// A session is reused while its last activity is younger than this
    pub const SESSION_REUSE_SECS: u64 = 3600;
}

/// Shop policy quoting
pub mod policy {
    /// Policies at or below this length are not quoted
    pub const MIN_MEANINGFUL_CHARS: usize = 50;

    /// Longest policy preview quoted in a response
    pub const PREVIEW_CHARS: usize = 500;

    /// How long a fetched policy is considered fresh
    pub const FRESHNESS_SECS: u64 = 3600;
}

/// Ranking defaults
pub mod ranking {
    /// Shortlist size for the semantic ranker
    pub const SEMANTIC_TOP_K: usize = 6;

    /// Shortlist size for the keyword ranker
    pub const KEYWORD_TOP_N: usize = 6;

    /// Products shown when nothing ranked
    pub const FEATURED_COUNT: usize = 3;

    /// Candidates below this cosine similarity are dropped
    pub const MIN_SIMILARITY: f32 = 0.05;

    /// Keyword score per query token found in the title
    pub const TITLE_TOKEN_SCORE: u32 = 5;

    /// Keyword score per query token found in the description
    pub const DESCRIPTION_TOKEN_SCORE: u32 = 2;

    /// Inventory at or below this count gets a low-stock badge
    pub const LOW_STOCK_THRESHOLD: i64 = 5;
}

/// Personalization boosts on the 0-100 relevance scale
pub mod personalization {
    pub const RECENTLY_VIEWED_BOOST: u32 = 10;
    pub const PRICE_RANGE_BOOST: u32 = 5;
    pub const FAVORITE_COLOR_BOOST: u32 = 3;
    pub const MAX_RELEVANCE: u32 = 100;
}

/// Embedding generation
pub mod embedding {
    /// Character budget for the text sent to the embedding endpoint
    pub const TEXT_BUDGET_CHARS: usize = 2000;

    /// Pause between network calls during batch generation (ms)
    pub const BATCH_DELAY_MS: u64 = 200;

    /// Dimension of the offline hashing embedder
    pub const HASH_DIMENSION: usize = 256;

    /// Dimension of `nomic-embed-text`
    pub const OLLAMA_DIMENSION: usize = 768;

    /// Dimension of `text-embedding-3-small`
    pub const OPENAI_DIMENSION: usize = 1536;
}

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Ollama endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// OpenAI API endpoint
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";
}

/// Timeouts (in milliseconds unless noted)
pub mod timeouts {
    /// LLM intent/sentiment classification call
    pub const CLASSIFIER_MS: u64 = 3_000;

    /// Single embedding request
    pub const EMBEDDING_MS: u64 = 5_000;

    /// External workflow backend call
    pub const WORKFLOW_MS: u64 = 10_000;

    /// Semantic ranking, query plus on-demand product embeddings
    pub const SEMANTIC_BUDGET_MS: u64 = 6_000;

    /// Whole fallback pipeline
    pub const FALLBACK_BUDGET_MS: u64 = 15_000;

    /// HTTP request timeout (seconds)
    pub const HTTP_REQUEST_SECS: u64 = 30;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_bounds() {
        assert!(policy::MIN_MEANINGFUL_CHARS < policy::PREVIEW_CHARS);
    }

    #[test]
    fn test_ranking_defaults() {
        assert!(ranking::FEATURED_COUNT <= ranking::KEYWORD_TOP_N);
        assert!(ranking::TITLE_TOKEN_SCORE > ranking::DESCRIPTION_TOKEN_SCORE);
        assert!((0.0..1.0).contains(&ranking::MIN_SIMILARITY));
    }

    #[test]
    fn test_fallback_budget_covers_per_call_timeouts() {
        assert!(timeouts::FALLBACK_BUDGET_MS > timeouts::CLASSIFIER_MS + timeouts::EMBEDDING_MS);
        assert!(timeouts::FALLBACK_BUDGET_MS > timeouts::CLASSIFIER_MS + timeouts::SEMANTIC_BUDGET_MS);
    }
}
