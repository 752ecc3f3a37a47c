//! Two-tier intent and sentiment classification
//!
//! Pattern rules answer most messages. When none match and an LLM backend
//! is configured, one zero-temperature call per label is made under a
//! timeout. Every failure degrades to OTHER/neutral; classification itself
//! never fails.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use storefront_chat_core::{mask_url, ClassificationSource, Intent, Locale, Sentiment, TierFailure};
use storefront_chat_llm::{
    intent_prompt, parse_intent, parse_sentiment, sentiment_prompt, LlmBackend, LlmError,
    SamplingParams,
};

use crate::rules;

const LABEL_MAX_TOKENS: usize = 8;

/// Labels assigned to one shopper message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub intent_source: ClassificationSource,
    pub sentiment_source: ClassificationSource,
}

/// Intent and sentiment classifier
#[derive(Clone)]
pub struct IntentClassifier {
    llm: Option<Arc<dyn LlmBackend>>,
    timeout: Duration,
}

impl IntentClassifier {
    /// Rules-only classifier
    pub fn rules_only() -> Self {
        Self {
            llm: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn new(llm: Option<Arc<dyn LlmBackend>>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Classify intent and sentiment
    pub async fn classify(&self, utterance: &str, locale_hint: Option<Locale>) -> Classification {
        let (intent, intent_source) = match rules::match_intent(utterance) {
            Some(intent) => (intent, ClassificationSource::Rules),
            None => self.intent_with_fallback(utterance, locale_hint).await,
        };

        let (sentiment, sentiment_source) = match rules::match_sentiment(utterance) {
            Some(sentiment) => (sentiment, ClassificationSource::Rules),
            None => self.sentiment_with_fallback(utterance).await,
        };

        tracing::debug!(
            intent = %intent,
            sentiment = %sentiment,
            intent_source = ?intent_source,
            sentiment_source = ?sentiment_source,
            "Classified message"
        );

        Classification {
            intent,
            sentiment,
            intent_source,
            sentiment_source,
        }
    }

    async fn intent_with_fallback(
        &self,
        utterance: &str,
        locale_hint: Option<Locale>,
    ) -> (Intent, ClassificationSource) {
        match self.llm_intent(utterance, locale_hint).await {
            Ok(intent) => (intent, ClassificationSource::Llm),
            Err(TierFailure::NotConfigured(_)) => (Intent::default(), ClassificationSource::Default),
            Err(failure) => {
                tracing::warn!(reason = failure.label(), error = %failure, "LLM intent classification failed");
                (Intent::default(), ClassificationSource::Default)
            }
        }
    }

    async fn sentiment_with_fallback(&self, utterance: &str) -> (Sentiment, ClassificationSource) {
        match self.llm_sentiment(utterance).await {
            Ok(sentiment) => (sentiment, ClassificationSource::Llm),
            Err(TierFailure::NotConfigured(_)) => (Sentiment::default(), ClassificationSource::Default),
            Err(failure) => {
                tracing::warn!(reason = failure.label(), error = %failure, "LLM sentiment classification failed");
                (Sentiment::default(), ClassificationSource::Default)
            }
        }
    }

    async fn llm_intent(&self, utterance: &str, locale_hint: Option<Locale>) -> Result<Intent, TierFailure> {
        let answer = self.ask(&intent_prompt(utterance, locale_hint)).await?;
        parse_intent(&answer).ok_or_else(|| TierFailure::Malformed(format!("unrecognised intent '{}'", answer.trim())))
    }

    async fn llm_sentiment(&self, utterance: &str) -> Result<Sentiment, TierFailure> {
        let answer = self.ask(&sentiment_prompt(utterance)).await?;
        parse_sentiment(&answer)
            .ok_or_else(|| TierFailure::Malformed(format!("unrecognised sentiment '{}'", answer.trim())))
    }

    async fn ask(&self, messages: &[storefront_chat_llm::Message]) -> Result<String, TierFailure> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| TierFailure::NotConfigured("no LLM backend".to_string()))?;

        let params = SamplingParams::deterministic(LABEL_MAX_TOKENS);
        match tokio::time::timeout(self.timeout, llm.generate(messages, &params)).await {
            Err(_) => Err(TierFailure::Timeout(self.timeout)),
            Ok(Err(LlmError::Timeout)) => Err(TierFailure::Timeout(self.timeout)),
            Ok(Err(LlmError::Configuration(msg))) => Err(TierFailure::NotConfigured(msg)),
            Ok(Err(LlmError::InvalidResponse(msg))) => Err(TierFailure::Malformed(msg)),
            Ok(Err(e)) => Err(TierFailure::Upstream(mask_url(&e.to_string()))),
            Ok(Ok(result)) => Ok(result.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storefront_chat_llm::{GenerationResult, Message};

    struct ScriptedLlm {
        answer: &'static str,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(answer: &'static str) -> Self {
            Self {
                answer,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedLlm {
        async fn generate(
            &self,
            messages: &[Message],
            params: &SamplingParams,
        ) -> Result<GenerationResult, LlmError> {
            assert_eq!(params.temperature, Some(0.0));
            assert!(!messages.is_empty());
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(GenerationResult {
                text: self.answer.to_string(),
                tokens: 1,
                total_time_ms: 1,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmBackend for FailingLlm {
        async fn generate(&self, _: &[Message], _: &SamplingParams) -> Result<GenerationResult, LlmError> {
            Err(LlmError::Network("connection refused to https://x?key=secret123".to_string()))
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_rules_win_without_llm_call() {
        let llm = Arc::new(ScriptedLlm::new("SUPPORT"));
        let classifier = IntentClassifier::new(Some(llm.clone()), Duration::from_secs(1));

        let result = classifier.classify("I love this, do you ship to Canada?", None).await;
        assert_eq!(result.intent, Intent::Shipping);
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.intent_source, ClassificationSource::Rules);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_llm_fallback_used_when_no_rule_matches() {
        let llm = Arc::new(ScriptedLlm::new("PRODUCT_SEARCH"));
        let classifier = IntentClassifier::new(Some(llm.clone()), Duration::from_secs(1));

        let result = classifier.classify("red dress", Some(Locale::En)).await;
        assert_eq!(result.intent, Intent::ProductSearch);
        assert_eq!(result.intent_source, ClassificationSource::Llm);
        // Sentiment answer "PRODUCT_SEARCH" is not a sentiment label
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.sentiment_source, ClassificationSource::Default);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rules_only_defaults() {
        let classifier = IntentClassifier::rules_only();
        let result = classifier.classify("red dress", None).await;
        assert_eq!(result.intent, Intent::Other);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.intent_source, ClassificationSource::Default);
    }

    #[tokio::test]
    async fn test_llm_timeout_degrades_to_default() {
        let llm = Arc::new(ScriptedLlm {
            answer: "SHIPPING",
            delay: Duration::from_millis(500),
            calls: AtomicUsize::new(0),
        });
        let classifier = IntentClassifier::new(Some(llm), Duration::from_millis(20));

        let result = classifier.classify("red dress", None).await;
        assert_eq!(result.intent, Intent::Other);
        assert_eq!(result.intent_source, ClassificationSource::Default);
    }

    #[tokio::test]
    async fn test_llm_error_degrades_to_default() {
        let classifier = IntentClassifier::new(Some(Arc::new(FailingLlm)), Duration::from_secs(1));
        let result = classifier.classify("blue", None).await;
        assert_eq!(result.intent, Intent::Other);
        assert_eq!(result.sentiment, Sentiment::Neutral);
    }
}
