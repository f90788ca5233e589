//! Hearth Core Library
//!
//! Shared functionality for the Hearth household budgeting tool:
//! - Encrypted database access and migrations
//! - PDF bank statement parsers
//! - Transaction fingerprinting and dedup
//! - Merchant key extraction heuristics
//! - Categorization engine (merchants, overrides, regex rules)
//! - Rule mining from reviewed transactions
//! - Local text classifier with per-household model storage
//! - Ingestion orchestration and recategorization sweeps

pub mod categorize;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod ingest;
pub mod maintenance;
pub mod merchant;
pub mod mining;
pub mod ml;
pub mod models;
pub mod parse;

pub use categorize::categorize_transaction;
pub use db::{Database, RuleUpsertResult, TransactionInsertResult};
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use ingest::{ingest_import, IngestSummary};
pub use maintenance::{backfill_merchant_keys, recategorize, RecategorizeSummary};
pub use merchant::{extract_display_name, extract_merchant_key, UNKNOWN_MERCHANT};
pub use mining::{mine_rules, MiningSummary};
pub use ml::{FsModelStore, ModelStore, Prediction, TrainOptions, TrainReport};
pub use models::ModelType;
pub use parse::{parser_for, ParseOutcome, StatementParser, SUPPORTED_BANKS};
