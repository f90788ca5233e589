//! Merchant key extraction
//!
//! Turns raw bank transaction descriptions into stable, normalized merchant
//! keys ("AMAZON", "COSTCO") using deterministic offline heuristics. The key
//! is the join point for merchant-level categorization: every transaction
//! carrying the same key is the same merchant.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel key when no meaningful merchant can be extracted
pub const UNKNOWN_MERCHANT: &str = "UNKNOWN";

/// Transaction-channel prefixes stripped before tokenization.
/// Ordered longest-variant-first so compound prefixes win.
const STRIP_PREFIXES: &[&str] = &[
    "POS PURCHASE",
    "POS PUR",
    "POS DEBIT",
    "POS REFUND",
    "DEBIT CARD PURCHASE",
    "DEBIT CARD REFUND",
    "DEBIT CARD",
    "CREDIT CARD",
    "CHECKCARD",
    "CHECK CARD",
    "VISA DEBIT",
    "VISA CREDIT",
    "MASTERCARD DEBIT",
    "MASTERCARD CREDIT",
    "RECURRING PAYMENT",
    "RECURRING",
    "PREAUTHORIZED",
    "PRE-AUTHORIZED",
    "AUTHORIZED",
    "PURCHASE",
    "WITHDRAWAL",
    "ACH DEBIT",
    "ACH CREDIT",
    "ACH PAYMENT",
    "ACH",
    "WIRE TRANSFER",
    "WIRE",
    "ONLINE TRANSFER",
    "ONLINE PAYMENT",
    "ONLINE",
    "MOBILE PAYMENT",
    "MOBILE TRANSFER",
    "MOBILE",
    "ZELLE PAYMENT",
    "ZELLE TO",
    "ZELLE FROM",
    "ZELLE",
    "VENMO PAYMENT",
    "VENMO CASHOUT",
    "VENMO",
    "PAYPAL TRANSFER",
    "PAYPAL PAYMENT",
    "PAYPAL",
    "SQUARE PAYMENT",
    "SQUARE",
    "CASH APP",
    "ATM WITHDRAWAL",
    "ATM DEPOSIT",
    "ATM",
    "DEPOSIT",
    "REFUND",
    "RETURN",
];

/// Tokens with no merchant-identifying value
const GENERIC_TOKENS: &[&str] = &[
    "PAYMENT",
    "TRANSFER",
    "CHECK",
    "WITHDRAWAL",
    "DEPOSIT",
    "ONLINE",
    "CARD",
    "DEBIT",
    "CREDIT",
    "PURCHASE",
    "TRANSACTION",
    "TXN",
    "REF",
    "REFERENCE",
    "CONF",
    "CONFIRMATION",
    "AUTH",
    "AUTHORIZED",
    "PENDING",
    "POSTED",
    "PROCESSED",
    "COMPLETED",
    "FROM",
    "TO",
    "FOR",
    "THE",
    "AND",
    "INC",
    "LLC",
    "CORP",
    "LTD",
    "CO",
    "POS",
];

/// How a canonical-merchant pattern matches against cleaned text
#[derive(Debug, Clone, Copy)]
enum MatchKind {
    StartsWith,
    Contains,
    Equals,
}

/// Well-known merchants whose raw descriptions vary too much for
/// token extraction; mapped straight to a canonical key.
const MERCHANT_MAPPINGS: &[(MatchKind, &str, &str)] = &[
    (MatchKind::StartsWith, "COSTCO", "COSTCO"),
    (MatchKind::StartsWith, "AMZN", "AMAZON"),
    (MatchKind::Contains, "AMAZON", "AMAZON"),
    (MatchKind::StartsWith, "AMAZN", "AMAZON"),
    (MatchKind::Equals, "WAL-MART", "WALMART"),
    (MatchKind::StartsWith, "WALMART", "WALMART"),
    (MatchKind::StartsWith, "WAL MART", "WALMART"),
    (MatchKind::StartsWith, "TARGET", "TARGET"),
    (MatchKind::StartsWith, "STARBUCKS", "STARBUCKS"),
    (MatchKind::StartsWith, "SBUX", "STARBUCKS"),
    (MatchKind::StartsWith, "MCDONALD", "MCDONALDS"),
    (MatchKind::StartsWith, "NETFLIX", "NETFLIX"),
    (MatchKind::StartsWith, "SPOTIFY", "SPOTIFY"),
    (MatchKind::StartsWith, "UBER EATS", "UBER EATS"),
    (MatchKind::StartsWith, "UBEREATS", "UBER EATS"),
    (MatchKind::StartsWith, "UBER", "UBER"),
    (MatchKind::StartsWith, "LYFT", "LYFT"),
    (MatchKind::StartsWith, "DOORDASH", "DOORDASH"),
    (MatchKind::StartsWith, "GRUBHUB", "GRUBHUB"),
    (MatchKind::StartsWith, "CHIPOTLE", "CHIPOTLE"),
    (MatchKind::StartsWith, "CHEVRON", "CHEVRON"),
    (MatchKind::StartsWith, "SHELL", "SHELL"),
    (MatchKind::StartsWith, "EXXON", "EXXON"),
    (MatchKind::StartsWith, "CVS", "CVS"),
    (MatchKind::StartsWith, "WALGREENS", "WALGREENS"),
    (MatchKind::StartsWith, "TRADER JOE", "TRADER JOES"),
    (MatchKind::StartsWith, "WHOLE FOODS", "WHOLE FOODS"),
    (MatchKind::StartsWith, "WHOLEFOODS", "WHOLE FOODS"),
    (MatchKind::StartsWith, "HOME DEPOT", "HOME DEPOT"),
    (MatchKind::StartsWith, "HOMEDEPOT", "HOME DEPOT"),
    (MatchKind::StartsWith, "LOWES", "LOWES"),
    (MatchKind::StartsWith, "LOWE'S", "LOWES"),
    (MatchKind::StartsWith, "BESTBUY", "BEST BUY"),
    (MatchKind::StartsWith, "BEST BUY", "BEST BUY"),
];

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b").expect("valid regex"));
static LONG_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5,}\b").expect("valid regex"));
static STORE_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+").expect("valid regex"));
static TRAILING_DIGITS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d+$").expect("valid regex"));
static SEPARATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*.\-—_]+").expect("valid regex"));
// Trailing "CITY ST" locations, e.g. "SAN FRANCISCO CA"
static CITY_STATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[A-Z]{2,}\s+[A-Z]{2}\s*$").expect("valid regex"));
static STATE_ONLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[A-Z]{2}\s*$").expect("valid regex"));
static VALID_TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9&.'\-]+$").expect("valid regex"));
static LETTERS_ONLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+$").expect("valid regex"));

/// Uppercase, trim and collapse internal whitespace
pub fn normalize_text(s: &str) -> String {
    s.to_uppercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_prefixes(text: &str) -> String {
    for prefix in STRIP_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    text.to_string()
}

fn remove_location_suffix(text: &str) -> String {
    let mut text = CITY_STATE_PATTERN.replace(text, "").into_owned();
    // A bare state code is only stripped when substantial text precedes it,
    // otherwise short merchant names like "BP GA" would vanish entirely.
    if text.len() > 5 {
        text = STATE_ONLY_PATTERN.replace(&text, "").into_owned();
    }
    text.trim().to_string()
}

fn check_special_merchants(text: &str) -> Option<&'static str> {
    for (kind, pattern, canonical) in MERCHANT_MAPPINGS {
        let hit = match kind {
            MatchKind::StartsWith => text.starts_with(pattern),
            MatchKind::Contains => text.contains(pattern),
            MatchKind::Equals => text == *pattern,
        };
        if hit {
            return Some(canonical);
        }
    }
    None
}

fn is_valid_token(token: &str) -> bool {
    if token.len() < 2 {
        return false;
    }
    if GENERIC_TOKENS.contains(&token) {
        return false;
    }
    if !VALID_TOKEN_PATTERN.is_match(token) {
        return false;
    }
    // All-digit tokens are reference numbers, not names
    !token.chars().all(|c| c.is_ascii_digit())
}

/// Letters-only tokens of length >= 3 carry the most merchant signal
fn is_strong_token(token: &str) -> bool {
    token.len() >= 3 && LETTERS_ONLY_PATTERN.is_match(token)
}

fn extract_tokens(text: &str, max_tokens: usize) -> Vec<String> {
    let mut strong = Vec::new();
    let mut other = Vec::new();

    for raw in text.split_whitespace() {
        let token = raw.trim_matches(|c| ".,;:!?*".contains(c));
        if !is_valid_token(token) {
            continue;
        }
        if is_strong_token(token) {
            strong.push(token.to_string());
        } else {
            other.push(token.to_string());
        }
    }

    let mut result: Vec<String> = strong.into_iter().take(max_tokens).collect();
    if result.len() < max_tokens {
        result.extend(other.into_iter().take(max_tokens - result.len()));
    }
    result
}

/// Extract a stable merchant key from a transaction description.
///
/// Returns a normalized key like "COSTCO" or "AMAZON", or
/// [`UNKNOWN_MERCHANT`] if nothing meaningful survives cleanup.
pub fn extract_merchant_key(description: &str) -> String {
    if description.trim().is_empty() {
        return UNKNOWN_MERCHANT.to_string();
    }

    let mut text = normalize_text(description);
    text = strip_prefixes(&text);
    text = SEPARATOR_PATTERN.replace_all(&text, " ").into_owned();
    text = DATE_PATTERN.replace_all(&text, "").into_owned();
    text = LONG_NUMBER_PATTERN.replace_all(&text, "").into_owned();
    text = STORE_NUMBER_PATTERN.replace_all(&text, "").into_owned();
    text = TRAILING_DIGITS_PATTERN.replace(&text, "").into_owned();
    text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    // Canonical mappings run before location stripping, which could
    // otherwise eat part of a multi-word merchant name.
    if let Some(canonical) = check_special_merchants(&text) {
        return canonical.to_string();
    }

    text = remove_location_suffix(&text);

    if let Some(canonical) = check_special_merchants(&text) {
        return canonical.to_string();
    }

    let tokens = extract_tokens(&text, 2);
    if tokens.is_empty() {
        return UNKNOWN_MERCHANT.to_string();
    }

    let key = tokens.join(" ").trim().to_string();
    if key.is_empty() {
        UNKNOWN_MERCHANT.to_string()
    } else {
        key
    }
}

/// Human-friendly merchant name for a description.
///
/// Currently the same as the key; kept separate so display formatting
/// can diverge without touching the join key.
pub fn extract_display_name(description: &str) -> String {
    extract_merchant_key(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amazon_pos_purchase() {
        assert_eq!(
            extract_merchant_key("POS PURCHASE AMZN MKTP US*1A2B3C SEATTLE WA"),
            "AMAZON"
        );
    }

    #[test]
    fn test_costco_with_store_number() {
        assert_eq!(extract_merchant_key("COSTCO WHSE #0482 SEATTLE WA"), "COSTCO");
    }

    #[test]
    fn test_netflix_recurring() {
        assert_eq!(extract_merchant_key("RECURRING PAYMENT NETFLIX.COM"), "NETFLIX");
    }

    #[test]
    fn test_empty_description() {
        assert_eq!(extract_merchant_key(""), UNKNOWN_MERCHANT);
        assert_eq!(extract_merchant_key("   "), UNKNOWN_MERCHANT);
    }

    #[test]
    fn test_only_numbers_is_unknown() {
        assert_eq!(extract_merchant_key("CHECK 1234567"), UNKNOWN_MERCHANT);
    }

    #[test]
    fn test_generic_merchant_two_tokens() {
        assert_eq!(
            extract_merchant_key("CHECKCARD 01/15 BLUE BOTTLE COFFEE OAKLAND CA 24692164"),
            "BLUE BOTTLE"
        );
    }

    #[test]
    fn test_walmart_variants() {
        assert_eq!(extract_merchant_key("WAL-MART"), "WALMART");
        assert_eq!(extract_merchant_key("WALMART SUPERCENTER #2341"), "WALMART");
    }

    #[test]
    fn test_uber_eats_before_uber() {
        assert_eq!(extract_merchant_key("UBER EATS SAN FRANCISCO CA"), "UBER EATS");
        assert_eq!(extract_merchant_key("UBER TRIP HELP.UBER.COM"), "UBER");
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(
            extract_merchant_key("pos purchase   starbucks #123"),
            extract_merchant_key("POS PURCHASE STARBUCKS #123")
        );
    }

    #[test]
    fn test_short_name_keeps_state_like_suffix() {
        // Text of <= 5 chars keeps a trailing two-letter token
        assert_eq!(extract_merchant_key("BP GA"), "BP GA");
        // Longer text sheds the bare state code
        assert_eq!(extract_merchant_key("SAFEWAY CA"), "SAFEWAY");
    }

    #[test]
    fn test_display_name_matches_key() {
        assert_eq!(extract_display_name("NETFLIX.COM 866-579-7172"), "NETFLIX");
    }
}
