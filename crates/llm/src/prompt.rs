//! Prompt building for classification calls

use serde::{Deserialize, Serialize};
use std::fmt;

use storefront_chat_core::{Intent, Locale, Sentiment};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Single-shot prompt asking for exactly one intent label
pub fn intent_prompt(utterance: &str, locale_hint: Option<Locale>) -> Vec<Message> {
    let labels: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
    let language = match locale_hint {
        Some(locale) => format!(" The message is probably written in {}.", locale.name()),
        None => String::new(),
    };
    vec![
        Message::system(format!(
            "You classify messages sent to an online store's chat assistant.{} \
             Reply with exactly one label from this list and nothing else: {}",
            language,
            labels.join(", ")
        )),
        Message::user(utterance.to_string()),
    ]
}

/// Single-shot prompt asking for a sentiment label
pub fn sentiment_prompt(utterance: &str) -> Vec<Message> {
    vec![
        Message::system(
            "Classify the sentiment of the shopper's message. \
             Reply with exactly one word: positive, neutral or negative.",
        ),
        Message::user(utterance.to_string()),
    ]
}

/// Pull an intent label out of a model answer
///
/// Models sometimes wrap the label in quotes or a sentence; the first
/// recognised label token wins.
pub fn parse_intent(answer: &str) -> Option<Intent> {
    if let Some(intent) = Intent::from_label(answer.trim().trim_matches(|c: char| !c.is_alphanumeric() && c != '_')) {
        return Some(intent);
    }
    answer
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .find_map(Intent::from_label)
}

/// Pull a sentiment label out of a model answer
pub fn parse_sentiment(answer: &str) -> Option<Sentiment> {
    answer
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .find_map(Sentiment::from_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_prompt_lists_every_label() {
        let messages = intent_prompt("do you ship to Canada?", Some(Locale::Fr));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        for intent in Intent::ALL {
            assert!(messages[0].content.contains(intent.as_str()));
        }
        assert!(messages[0].content.contains("French"));
        assert_eq!(messages[1].content, "do you ship to Canada?");
    }

    #[test]
    fn test_parse_intent_tolerates_wrapping() {
        assert_eq!(parse_intent("SHIPPING"), Some(Intent::Shipping));
        assert_eq!(parse_intent("\"size_fit\"."), Some(Intent::SizeFit));
        assert_eq!(parse_intent("Label: PRICE_INQUIRY"), Some(Intent::PriceInquiry));
        assert_eq!(parse_intent("I am not sure"), None);
    }

    #[test]
    fn test_parse_sentiment() {
        assert_eq!(parse_sentiment("Negative."), Some(Sentiment::Negative));
        assert_eq!(parse_sentiment("mixed"), None);
    }
}
