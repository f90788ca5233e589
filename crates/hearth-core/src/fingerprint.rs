//! Transaction fingerprints for deduplication
//!
//! A fingerprint is a SHA-256 digest over `date|amount|normalized_description`.
//! Two candidates with the same fingerprint are the same real-world transaction
//! and must collapse to one stored record, both within a single import batch
//! and across imports.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Normalize a description for fingerprinting: lowercase, trim, collapse
/// internal whitespace.
pub fn normalize_description(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compute the dedup fingerprint for a transaction candidate.
///
/// The amount is rendered with two decimal places so that `1.5` and `1.50`
/// hash identically regardless of how the parser produced them.
pub fn fingerprint(posted_date: NaiveDate, amount: f64, description: &str) -> String {
    let input = format!(
        "{}|{:.2}|{}",
        posted_date.format("%Y-%m-%d"),
        amount,
        normalize_description(description)
    );
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
