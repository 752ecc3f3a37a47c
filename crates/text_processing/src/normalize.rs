//! Text normalization for product copy and shopper messages

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("static regex")
});

/// Remove HTML tags and decode the handful of entities product copy uses
pub fn strip_html(text: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(text, " ");
    let without_tags = HTML_TAG.replace_all(&without_blocks, " ");
    without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` grapheme clusters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.graphemes(true).take(max_chars).collect()
}

/// Truncate with an ellipsis when something was cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let count = text.graphemes(true).count();
    if count <= max_chars {
        return text.to_string();
    }
    let cut: String = text.graphemes(true).take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Text embedded for a product: `title. description`, cleaned and bounded
pub fn embedding_text(title: &str, description: &str, budget_chars: usize) -> String {
    let title = collapse_whitespace(&strip_html(title));
    let description = collapse_whitespace(&strip_html(description));

    let combined = if description.is_empty() {
        title
    } else if title.is_empty() {
        description
    } else {
        format!("{}. {}", title, description)
    };

    truncate_chars(&combined, budget_chars)
}
