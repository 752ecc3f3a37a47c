//! Text processing for shopper messages
//!
//! This crate provides:
//! - **Classification**: intent and sentiment by ordered pattern rules with
//!   an optional LLM fallback
//! - **Locale detection**: script and function-word heuristics for `auto` requests
//! - **Price constraints**: "under $100" style bounds pulled out of queries
//! - **Normalization**: HTML stripping, whitespace collapsing, safe truncation
//! - **Tokenization**: stopwords, light stemming and CJK bigrams for keyword ranking

pub mod classifier;
pub mod locale;
pub mod normalize;
pub mod price;
pub mod rules;
pub mod tokenize;

pub use classifier::{Classification, IntentClassifier};
pub use locale::detect_locale;
pub use normalize::{collapse_whitespace, embedding_text, preview, strip_html, truncate_chars};
pub use price::{describe_price_range, extract_price_constraint};
pub use rules::{match_intent, match_sentiment};
pub use tokenize::{is_stopword, stem, tokenize};
