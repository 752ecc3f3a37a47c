//! Heuristic locale detection for `auto` requests
//!
//! Script decides between Japanese, Chinese and latin languages; latin
//! languages are then voted on by common function words and diacritics.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use storefront_chat_core::Locale;

static FUNCTION_WORDS: Lazy<HashMap<&'static str, Vec<Locale>>> = Lazy::new(|| {
    let table: [(Locale, &[&str]); 6] = [
        (
            Locale::En,
            &[
                "the", "and", "you", "have", "for", "with", "show", "me", "looking", "do", "is",
                "what", "hi", "hello", "thanks", "your", "my", "how", "where", "can", "i",
            ],
        ),
        (
            Locale::Fr,
            &[
                "le", "la", "les", "des", "est", "je", "vous", "avez", "pour", "avec", "une",
                "bonjour", "merci", "cherche", "quel", "quelle", "mon", "ma", "où", "c'est",
            ],
        ),
        (
            Locale::Es,
            &[
                "el", "los", "las", "una", "tienen", "hola", "gracias", "busco", "quiero", "dónde",
                "cuánto", "mi", "es", "por", "envío", "qué",
            ],
        ),
        (
            Locale::De,
            &[
                "der", "die", "das", "und", "ich", "haben", "sie", "mit", "für", "nicht", "ein",
                "eine", "hallo", "danke", "suche", "ist", "wie", "mein", "wo",
            ],
        ),
        (
            Locale::It,
            &[
                "il", "gli", "che", "sono", "avete", "ciao", "grazie", "cerco", "vorrei", "della",
                "mio", "dove", "quanto", "è",
            ],
        ),
        (
            Locale::Pt,
            &[
                "os", "uma", "vocês", "você", "tem", "olá", "obrigado", "obrigada", "procuro",
                "quero", "não", "meu", "onde", "quanto", "é",
            ],
        ),
    ];

    let mut map: HashMap<&'static str, Vec<Locale>> = HashMap::new();
    for (locale, words) in table {
        for word in words {
            map.entry(*word).or_default().push(locale);
        }
    }
    map
});

fn is_kana(c: char) -> bool {
    matches!(c as u32, 0x3040..=0x30FF | 0xFF66..=0xFF9F)
}

fn is_han(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF)
}

/// Detect the language of a shopper message, `None` when there is no signal
pub fn detect_locale(text: &str) -> Option<Locale> {
    if text.chars().any(is_kana) {
        return Some(Locale::Ja);
    }
    if text.chars().any(is_han) {
        return Some(Locale::Zh);
    }

    let lowered = text.to_lowercase();
    let mut scores: HashMap<Locale, u32> = HashMap::new();

    for word in lowered.split(|c: char| !(c.is_alphanumeric() || c == '\'')) {
        if let Some(locales) = FUNCTION_WORDS.get(word) {
            for locale in locales {
                *scores.entry(*locale).or_default() += 2;
            }
        }
    }

    for c in lowered.chars() {
        let hint = match c {
            'ñ' | '¿' | '¡' => Some(Locale::Es),
            'ã' | 'õ' => Some(Locale::Pt),
            'ß' | 'ä' | 'ö' | 'ü' => Some(Locale::De),
            'è' | 'ê' | 'œ' | 'ç' => Some(Locale::Fr),
            'ì' | 'ò' => Some(Locale::It),
            _ => None,
        };
        if let Some(locale) = hint {
            *scores.entry(locale).or_default() += 1;
        }
    }

    // Ties resolve in `Locale::ALL` order, so English wins an even split
    Locale::ALL
        .iter()
        .filter_map(|l| scores.get(l).map(|s| (*l, *s)))
        .fold(None, |best: Option<(Locale, u32)>, (locale, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((locale, score)),
        })
        .map(|(locale, _)| locale)
}
