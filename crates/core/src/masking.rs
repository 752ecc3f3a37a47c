//! Secret masking for log output
//!
//! Upstream errors are logged with API keys and webhook tokens masked.

use once_cell::sync::Lazy;
use regex::Regex;

static QUERY_SECRET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?:api[_-]?key|token|secret|signature|sig|key|auth)=)[^&\s]+")
        .expect("static regex")
});

static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._\-]+").expect("static regex"));

static SK_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsk-[A-Za-z0-9_\-]{6,}").expect("static regex"));

/// Mask a secret value, keeping at most the first four characters
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Mask credentials embedded in a URL or free-form error text
pub fn mask_url(text: &str) -> String {
    let masked = QUERY_SECRET.replace_all(text, "${1}****");
    let masked = BEARER.replace_all(&masked, "${1}****");
    SK_KEY.replace_all(&masked, "sk-****").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("abcdefghijkl"), "abcd****");
    }

    #[test]
    fn test_mask_url_query_params() {
        let masked = mask_url("https://hooks.example.com/run?token=abc123&shop=demo");
        assert_eq!(masked, "https://hooks.example.com/run?token=****&shop=demo");
    }

    #[test]
    fn test_mask_bearer_and_keys() {
        let masked = mask_url("401 for Bearer abc.def-ghi using sk-proj1234567890");
        assert!(!masked.contains("abc.def-ghi"));
        assert!(!masked.contains("proj1234567890"));
    }
}
