//! Domain models for Hearth

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A household - the scoping unit for accounts, merchants, rules and models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A bank account within a household
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub household_id: i64,
    /// Statement parser selector, e.g. "bofa"
    pub bank_code: Option<String>,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// A statement upload and its ingestion counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: i64,
    pub bank_account_id: i64,
    pub original_filename: Option<String>,
    pub stored_path: Option<String>,
    pub bank_code: Option<String>,
    pub imported_count: i64,
    pub skipped_count: i64,
    pub warning_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A spending category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
}

/// A transaction candidate produced by a statement parser.
///
/// Transient: not persisted directly, only after dedup and categorization.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub posted_date: NaiveDate,
    pub description: String,
    /// Signed: negative = withdrawal, positive = deposit
    pub amount: f64,
}

/// Insert payload for a new transaction row
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub posted_date: NaiveDate,
    pub description: String,
    pub merchant_key: Option<String>,
    pub amount: f64,
    pub category_id: Option<i64>,
    pub fingerprint: String,
}

/// A persisted transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub bank_account_id: i64,
    pub import_id: i64,
    pub posted_date: NaiveDate,
    pub description: String,
    /// Normalized merchant key ("AMAZON", "UNKNOWN")
    pub merchant_key: Option<String>,
    pub amount: f64,
    pub category_id: Option<i64>,
    /// Dedup digest over (date, amount, normalized description)
    pub fingerprint: String,
    pub is_reviewed: bool,
    pub created_at: DateTime<Utc>,
}

/// A merchant identified by its normalized key, unique per household
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: i64,
    pub household_id: i64,
    pub merchant_key: String,
    pub display_name: String,
    /// Category applied to every transaction carrying this key
    pub default_category_id: Option<i64>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Legacy merchant-to-category mapping, kept alongside
/// `Merchant::default_category_id` for backward compatibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantOverride {
    pub id: i64,
    pub household_id: i64,
    pub merchant_key: String,
    pub category_id: i64,
}

/// A regex categorization rule, user-created or mined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: i64,
    pub household_id: i64,
    /// Regex searched against the uppercased description
    pub pattern: String,
    pub category_id: Option<i64>,
    /// Lower = evaluated first; mined rules land in 10..=100
    pub priority: i64,
    pub enabled: bool,
}

/// A labeled example assembled from the categorized corpus
#[derive(Debug, Clone)]
pub struct TrainingExample {
    /// Merchant key and description concatenated
    pub text: String,
    pub category_id: i64,
}

/// Classifier flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Multinomial logistic regression (default)
    Logreg,
    /// One-vs-rest linear SVM
    Svm,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logreg => "logreg",
            Self::Svm => "svm",
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logreg" | "logistic" => Ok(Self::Logreg),
            "svm" | "linearsvc" => Ok(Self::Svm),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
