//! Categorization engine
//!
//! Assigns a category to a transaction from household state, in strict
//! precedence order:
//!
//! 1. Merchant default category (by merchant id, then by merchant key)
//! 2. Merchant override (legacy key-to-category mapping)
//! 3. Enabled regex rules, priority ascending
//! 4. No match
//!
//! Rules with invalid regex patterns are skipped, never fatal: one bad
//! user-entered pattern must not break categorization for the household.

use regex::RegexBuilder;
use tracing::warn;

use crate::db::Database;
use crate::error::Result;
use crate::merchant::{extract_merchant_key, UNKNOWN_MERCHANT};

/// Categorize a transaction description for a household.
///
/// When the caller already knows the merchant id or key, passing them
/// skips re-extraction. Returns `None` when nothing matches.
pub fn categorize_transaction(
    db: &Database,
    household_id: i64,
    description: &str,
    merchant_id: Option<i64>,
    merchant_key: Option<&str>,
) -> Result<Option<i64>> {
    // 1a. Direct merchant lookup
    if let Some(id) = merchant_id {
        if let Ok(merchant) = db.get_merchant(id) {
            if let Some(category_id) = merchant.default_category_id {
                return Ok(Some(category_id));
            }
        }
    }

    let key = match merchant_key {
        Some(k) => k.to_string(),
        None => extract_merchant_key(description),
    };

    // The UNKNOWN sentinel never identifies a merchant
    if !key.is_empty() && key != UNKNOWN_MERCHANT {
        // 1b. Merchant lookup by key
        if let Some(merchant) = db.merchant_by_key(household_id, &key)? {
            if let Some(category_id) = merchant.default_category_id {
                return Ok(Some(category_id));
            }
        }

        // 2. Merchant override
        if let Some(override_) = db.merchant_override(household_id, &key)? {
            return Ok(Some(override_.category_id));
        }
    }

    // 3. Regex rules, lowest priority number first
    let search_text = description.to_uppercase();
    for rule in db.enabled_rules(household_id)? {
        let re = match RegexBuilder::new(&rule.pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(_) => {
                warn!(rule_id = rule.id, pattern = %rule.pattern, "skipping invalid rule pattern");
                continue;
            }
        };
        if re.is_match(&search_text) {
            if let Some(category_id) = rule.category_id {
                return Ok(Some(category_id));
            }
        }
    }

    // 4. No match
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let household_id = db.create_household("test").unwrap();
        let groceries = db.get_or_create_category(household_id, "Groceries").unwrap();
        (db, household_id, groceries)
    }

    #[test]
    fn test_no_state_means_no_match() {
        let (db, hh, _) = setup();
        let got = categorize_transaction(&db, hh, "COSTCO WHSE #0482", None, None).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_merchant_default_category() {
        let (db, hh, groceries) = setup();
        let merchant_id = db.get_or_create_merchant(hh, "COSTCO", "COSTCO").unwrap();
        db.set_merchant_category(merchant_id, Some(groceries), 1.0).unwrap();

        let got = categorize_transaction(&db, hh, "COSTCO WHSE #0482 SEATTLE WA", None, None)
            .unwrap();
        assert_eq!(got, Some(groceries));
    }

    #[test]
    fn test_merchant_override_when_no_default() {
        let (db, hh, groceries) = setup();
        // Merchant exists but carries no default category
        db.get_or_create_merchant(hh, "COSTCO", "COSTCO").unwrap();
        db.set_merchant_override(hh, "COSTCO", groceries).unwrap();

        let got = categorize_transaction(&db, hh, "COSTCO WHSE #0482", None, None).unwrap();
        assert_eq!(got, Some(groceries));
    }

    #[test]
    fn test_merchant_beats_override_and_rules() {
        let (db, hh, groceries) = setup();
        let dining = db.get_or_create_category(hh, "Dining").unwrap();
        let fees = db.get_or_create_category(hh, "Fees").unwrap();

        let merchant_id = db.get_or_create_merchant(hh, "COSTCO", "COSTCO").unwrap();
        db.set_merchant_category(merchant_id, Some(groceries), 1.0).unwrap();
        db.set_merchant_override(hh, "COSTCO", dining).unwrap();
        db.create_rule(hh, r"\bCOSTCO\b", fees, 10).unwrap();

        let got = categorize_transaction(&db, hh, "COSTCO WHSE #0482", None, None).unwrap();
        assert_eq!(got, Some(groceries));
    }

    #[test]
    fn test_rules_by_priority_ascending() {
        let (db, hh, groceries) = setup();
        let dining = db.get_or_create_category(hh, "Dining").unwrap();

        db.create_rule(hh, r"\bNETFLIX\b", dining, 50).unwrap();
        db.create_rule(hh, r"\bNETFLIX\b.*", groceries, 10).unwrap();

        let got = categorize_transaction(&db, hh, "NETFLIX.COM 866-579-7172", None, None).unwrap();
        assert_eq!(got, Some(groceries));
    }

    #[test]
    fn test_invalid_rule_pattern_skipped() {
        let (db, hh, groceries) = setup();
        let dining = db.get_or_create_category(hh, "Dining").unwrap();

        db.create_rule(hh, r"[unclosed", dining, 1).unwrap();
        db.create_rule(hh, r"\bNETFLIX\b", groceries, 2).unwrap();

        let got = categorize_transaction(&db, hh, "NETFLIX.COM", None, None).unwrap();
        assert_eq!(got, Some(groceries));
    }

    #[test]
    fn test_rule_matching_is_case_insensitive() {
        let (db, hh, groceries) = setup();
        db.create_rule(hh, r"netflix", groceries, 10).unwrap();

        let got = categorize_transaction(&db, hh, "Netflix.com", None, None).unwrap();
        assert_eq!(got, Some(groceries));
    }

    #[test]
    fn test_unknown_key_skips_merchant_lookups() {
        let (db, hh, groceries) = setup();
        // A merchant stored under the sentinel key must never match
        let merchant_id = db.get_or_create_merchant(hh, "UNKNOWN", "UNKNOWN").unwrap();
        db.set_merchant_category(merchant_id, Some(groceries), 1.0).unwrap();

        let got = categorize_transaction(&db, hh, "CHECK 1234567", None, None).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_merchant_id_direct_lookup() {
        let (db, hh, groceries) = setup();
        let merchant_id = db.get_or_create_merchant(hh, "BLUE BOTTLE", "BLUE BOTTLE").unwrap();
        db.set_merchant_category(merchant_id, Some(groceries), 1.0).unwrap();

        let got =
            categorize_transaction(&db, hh, "something else entirely", Some(merchant_id), None)
                .unwrap();
        assert_eq!(got, Some(groceries));
    }
}
