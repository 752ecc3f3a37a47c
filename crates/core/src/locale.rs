//! Supported storefront locales
//!
//! The composer only carries message tables for this fixed set; anything
//! else resolves to English.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported response locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Es,
    De,
    It,
    Pt,
    Ja,
    Zh,
}

impl Locale {
    pub const ALL: [Locale; 8] = [
        Locale::En,
        Locale::Fr,
        Locale::Es,
        Locale::De,
        Locale::It,
        Locale::Pt,
        Locale::Ja,
        Locale::Zh,
    ];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::De => "de",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ja => "ja",
            Self::Zh => "zh",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Fr => "French",
            Self::Es => "Spanish",
            Self::De => "German",
            Self::It => "Italian",
            Self::Pt => "Portuguese",
            Self::Ja => "Japanese",
            Self::Zh => "Chinese",
        }
    }

    /// Parse a language tag such as `fr`, `fr-CA` or `pt_BR`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::ALL.iter().copied().find(|l| l.code() == primary)
    }

    /// Parse a tag, falling back to English for anything unsupported
    pub fn resolve(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_default()
    }

    /// Whether this locale writes without spaces between words
    pub fn is_cjk(&self) -> bool {
        matches!(self, Self::Ja | Self::Zh)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_variants() {
        assert_eq!(Locale::from_tag("fr"), Some(Locale::Fr));
        assert_eq!(Locale::from_tag("fr-CA"), Some(Locale::Fr));
        assert_eq!(Locale::from_tag("PT_br"), Some(Locale::Pt));
        assert_eq!(Locale::from_tag("nl"), None);
    }

    #[test]
    fn test_unsupported_resolves_to_english() {
        assert_eq!(Locale::resolve("ko"), Locale::En);
        assert_eq!(Locale::resolve(""), Locale::En);
        assert_eq!(Locale::resolve("zh-Hant"), Locale::Zh);
    }
}
