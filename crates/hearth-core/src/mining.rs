//! Rule mining from reviewed transactions
//!
//! Scans reviewed, categorized transactions for tokens that consistently
//! map to one category and turns them into regex rules. A token becomes a
//! rule when it appears in enough transactions (support) and nearly always
//! under the same category (precision).

use std::collections::{BTreeSet, HashMap};

use tracing::info;

use crate::db::{Database, RuleUpsertResult};
use crate::error::Result;

/// Minimum number of transactions a token must appear in
pub const MIN_SUPPORT: usize = 5;
/// Minimum share of those transactions in the majority category
pub const MIN_PRECISION: f64 = 0.90;

const STOPWORDS: &[&str] = &[
    "THE",
    "AND",
    "FOR",
    "FROM",
    "WITH",
    "POS",
    "PURCHASE",
    "DEBIT",
    "CREDIT",
    "CARD",
    "ONLINE",
    "PAYMENT",
    "TRANSFER",
    "TRANSACTION",
    "ACH",
    "WITHDRAWAL",
    "DEPOSIT",
    "CHECK",
    "WIRE",
    "MOBILE",
    "RECURRING",
    "AUTHORIZED",
    "REF",
    "CONF",
    "TXN",
    "INC",
    "LLC",
    "CORP",
    "LTD",
];

/// Outcome of one mining pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MiningSummary {
    pub created: usize,
    pub updated: usize,
    pub candidates: usize,
}

/// Tokenize text for mining: split on non-alphanumerics, uppercase,
/// drop short tokens, stopwords and pure numbers.
fn tokenize(text: &str) -> Vec<String> {
    text.to_uppercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 3)
        .filter(|t| !STOPWORDS.contains(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// Priority from precision and support: higher confidence runs first
/// (lower number). Clamped to 10..=100.
fn compute_priority(precision: f64, support: usize) -> i64 {
    let precision_score = ((1.0 - precision) * 400.0) as i64;
    let support_score = (50 - support.min(50) as i64).max(0);
    (10 + precision_score + support_score / 2).clamp(10, 100)
}

/// Mine category rules for a household from its reviewed transactions.
pub fn mine_rules(db: &Database, household_id: i64) -> Result<MiningSummary> {
    let examples = db.reviewed_examples(household_id)?;
    if examples.is_empty() {
        return Ok(MiningSummary::default());
    }

    // token -> (category_id -> count), plus total per token
    let mut per_category: HashMap<String, HashMap<i64, usize>> = HashMap::new();
    let mut totals: HashMap<String, usize> = HashMap::new();

    for (description, merchant_key, category_id) in &examples {
        let mut combined = description.clone();
        if let Some(key) = merchant_key {
            combined.push(' ');
            combined.push_str(key);
        }

        // Each token counts once per transaction
        let unique: BTreeSet<String> = tokenize(&combined).into_iter().collect();
        for token in unique {
            *per_category
                .entry(token.clone())
                .or_default()
                .entry(*category_id)
                .or_insert(0) += 1;
            *totals.entry(token).or_insert(0) += 1;
        }
    }

    // (token, category_id, precision, support)
    let mut candidates: Vec<(String, i64, f64, usize)> = Vec::new();
    for (token, total) in &totals {
        if *total < MIN_SUPPORT {
            continue;
        }
        let counts = &per_category[token];
        // Majority category; ties break toward the lower category id so
        // repeated mining passes stay deterministic
        let (&best_category, &best_count) = counts
            .iter()
            .max_by_key(|(id, count)| (**count, std::cmp::Reverse(**id)))
            .expect("token has at least one category");

        let precision = best_count as f64 / *total as f64;
        if precision >= MIN_PRECISION {
            candidates.push((token.clone(), best_category, precision, *total));
        }
    }

    // Strongest evidence first
    candidates.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.3.cmp(&a.3))
            .then(a.0.cmp(&b.0))
    });

    let mut summary = MiningSummary {
        candidates: candidates.len(),
        ..Default::default()
    };

    for (token, category_id, precision, support) in &candidates {
        let pattern = format!(r"\b{}\b", regex::escape(token));
        let priority = compute_priority(*precision, *support);

        match db.upsert_rule(household_id, &pattern, *category_id, priority)? {
            RuleUpsertResult::Created(_) => summary.created += 1,
            RuleUpsertResult::Updated(_) => summary.updated += 1,
        }
    }

    info!(
        created = summary.created,
        updated = summary.updated,
        candidates = summary.candidates,
        "rule mining pass complete"
    );
    Ok(summary)
}
