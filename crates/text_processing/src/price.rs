//! Price constraint extraction ("under $100", "between 20 and 40")

use once_cell::sync::Lazy;
use regex::Regex;

use storefront_chat_core::PriceRange;

const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)";
const CURRENCY: &str = r"(?:\$|€|£|¥|usd|eur|gbp)?";

static BETWEEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:between|from|entre|zwischen|tra|fra)\s*{c}\s*{a}\s*{c}\s*(?:and|to|-|et|y|e|und|a)\s*{c}\s*{a}",
        a = AMOUNT,
        c = CURRENCY
    ))
    .expect("static regex")
});

static RANGE_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:\$|€|£|¥)\s*{a}\s*-\s*{c}\s*{a}",
        a = AMOUNT,
        c = CURRENCY
    ))
    .expect("static regex")
});

static UPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:under|below|less than|cheaper than|no more than|max(?:imum)?|up to|at most|moins de|jusqu'à|menos de|hasta|unter|bis|sotto|meno di|fino a|até|abaixo de)\s*{c}\s*{a}",
        a = AMOUNT,
        c = CURRENCY
    ))
    .expect("static regex")
});

/// "within" only reads as a price with an explicit currency
static WITHIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bwithin\s*(?:(?:\$|€|£|¥|usd|eur|gbp)\s*{a}|{a}\s*(?:\$|€|£|¥|(?:dollars?|euros?|pounds?|usd|eur|gbp)\b))",
        a = AMOUNT
    ))
    .expect("static regex")
});

/// Units that make a number a duration or a count rather than a price
static NON_PRICE_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:business\s+)?(?:days?|weeks?|months?|hours?|hrs?|minutes?|mins?|years?|items?|pieces?|pcs|units?|percent|jours?|semaines?|días?|dias?|semanas?|tage?n?|wochen?|giorni|settimane)\b|%|日|週間|時間|天|周)",
    )
    .expect("static regex")
});

static LOWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:over|above|more than|at least|min(?:imum)?|plus de|au moins|más de|mas de|über|ab|sopra|più di|almeno|mais de|acima de)\s*{c}\s*{a}",
        a = AMOUNT,
        c = CURRENCY
    ))
    .expect("static regex")
});

static CJK_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:(?:円|元|ドル)?\s*(?:以下|未満)|(?:円|元|ドル)\s*以内)").expect("static regex"));

static CJK_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:円|元|ドル)?\s*以上").expect("static regex"));

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// First amount captured by `pattern` that is not a duration or a count
fn first_price(pattern: &Regex, text: &str) -> Option<f64> {
    pattern.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if NON_PRICE_UNIT.is_match(&text[whole.end()..]) {
            return None;
        }
        caps.iter().skip(1).flatten().next().and_then(|m| parse_amount(m.as_str()))
    })
}

/// Extract a price constraint from a shopper message
pub fn extract_price_constraint(text: &str) -> Option<PriceRange> {
    let lowered = text.to_lowercase();

    for pattern in [&*BETWEEN, &*RANGE_DASH] {
        if let Some(caps) = pattern.captures(&lowered) {
            let a = caps.get(1).and_then(|m| parse_amount(m.as_str()));
            let b = caps.get(2).and_then(|m| parse_amount(m.as_str()));
            if let (Some(a), Some(b)) = (a, b) {
                return Some(PriceRange::new(Some(a.min(b)), Some(a.max(b))));
            }
        }
    }

    let max = first_price(&UPPER, &lowered)
        .or_else(|| first_price(&WITHIN, &lowered))
        .or_else(|| first_price(&CJK_UPPER, &lowered));

    let min = first_price(&LOWER, &lowered).or_else(|| first_price(&CJK_LOWER, &lowered));

    if max.is_none() && min.is_none() {
        return None;
    }
    Some(PriceRange::new(min, max))
}

/// Analytics label for a price constraint, e.g. `price_max_100`
pub fn describe_price_range(range: &PriceRange) -> String {
    match (range.min, range.max) {
        (Some(min), Some(max)) => format!("price_between_{}_{}", min, max),
        (None, Some(max)) => format!("price_max_{}", max),
        (Some(min), None) => format!("price_min_{}", min),
        (None, None) => "price_any".to_string(),
    }
}
