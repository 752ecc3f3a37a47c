//! Query tokenization shared by keyword ranking and hash embeddings
//!
//! Latin-script words are lowercased, stopword-filtered and lightly stemmed.
//! Runs of CJK characters have no word boundaries, so they are split into
//! overlapping character bigrams instead.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Shortest latin token kept
pub const MIN_TOKEN_CHARS: usize = 3;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // English
        "the", "and", "for", "with", "you", "your", "are", "have", "has", "any", "show", "some",
        "what", "which", "that", "this", "these", "those", "can", "could", "would", "like",
        "want", "need", "looking", "look", "find", "please", "under", "over", "below", "above",
        "about", "from", "get", "got", "all", "but", "not", "our", "out", "there", "their",
        "them", "they", "was", "were", "will", "than", "then", "into", "also", "just", "how",
        "much", "many", "more", "less", "does", "did", "doing", "something", "anything",
        "sell", "selling", "carry", "buy", "between", "around", "cheaper", "max", "maximum",
        "dollars", "dollar", "usd", "eur", "euros", "euro",
        // French
        "les", "des", "une", "pour", "avec", "vous", "avez", "est", "sont", "dans", "sur",
        "moins", "plus", "cherche", "montre", "moi", "qui", "que",
        // Spanish
        "los", "las", "una", "para", "con", "tienen", "tiene", "busco", "quiero", "por",
        "menos", "muestrame", "muéstrame",
        // German
        "der", "die", "das", "und", "ein", "eine", "mit", "für", "ich", "suche", "haben",
        "sie", "unter", "zeig", "zeige", "mir",
        // Italian
        "gli", "per", "che", "sono", "avete", "cerco", "vorrei", "mostrami", "sotto",
        // Portuguese
        "uma", "com", "vocês", "você", "tem", "procuro", "quero", "até",
    ]
    .into_iter()
    .collect()
});

/// Whether the word is filtered out of keyword queries
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Whether `c` belongs to a script written without spaces
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF // Katakana
        | 0x3400..=0x4DBF // CJK Extension A
        | 0x4E00..=0x9FFF // CJK Unified Ideographs
        | 0xF900..=0xFAFF // CJK Compatibility Ideographs
        | 0xFF66..=0xFF9F // Half-width Katakana
    )
}

/// Light plural stemming
///
/// `dresses` → `dress`, `watches` → `watch`, `hoodies` → `hoodie`,
/// `shirts` → `shirt`; words ending in `ss`, `us` or `is` are kept.
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 || !word.ends_with('s') {
        return word.to_string();
    }

    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }

    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }

    word[..word.len() - 1].to_string()
}

/// Tokenize text into lowercased, stemmed, stopword-free terms
///
/// Order follows the text; duplicates are removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for word in lowered.split(|c: char| !(c.is_alphanumeric() || c == '\'')) {
        let word = word.trim_matches('\'');
        if word.is_empty() {
            continue;
        }

        if word.chars().any(is_cjk) {
            for gram in cjk_bigrams(word) {
                if seen.insert(gram.clone()) {
                    tokens.push(gram);
                }
            }
            continue;
        }

        if word.chars().count() < MIN_TOKEN_CHARS
            || word.chars().all(|c| c.is_ascii_digit())
            || is_stopword(word)
        {
            continue;
        }

        let stemmed = stem(word);
        if seen.insert(stemmed.clone()) {
            tokens.push(stemmed);
        }
    }

    tokens
}

fn cjk_bigrams(run: &str) -> Vec<String> {
    let chars: Vec<char> = run.chars().filter(|c| is_cjk(*c)).collect();
    match chars.len() {
        0 => Vec::new(),
        1 => vec![chars[0].to_string()],
        _ => chars.windows(2).map(|w| w.iter().collect()).collect(),
    }
}
