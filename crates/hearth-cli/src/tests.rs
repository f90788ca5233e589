//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::NaiveDate;
use hearth_core::db::Database;
use hearth_core::fingerprint::fingerprint;
use hearth_core::models::NewTransaction;

use crate::commands::{self, truncate};

fn setup_test_db() -> (Database, i64) {
    let db = Database::in_memory().unwrap();
    let household_id = db.create_household("Test").unwrap();
    db.seed_default_categories(household_id).unwrap();
    (db, household_id)
}

/// Create a test account and transaction, returning (account_id, tx_id)
fn create_test_transaction(db: &Database, household_id: i64, description: &str, amount: f64) -> (i64, i64) {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let account_id = db
        .create_bank_account(household_id, "Test", Some("bofa"))
        .unwrap();
    let import_id = db
        .create_import(account_id, None, None, Some("bofa"))
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let unique = format!("{} {}", description, COUNTER.fetch_add(1, Ordering::SeqCst));
    let tx = NewTransaction {
        posted_date: date,
        description: description.to_string(),
        merchant_key: None,
        amount,
        category_id: None,
        fingerprint: fingerprint(date, amount, &unique),
    };
    let tx_id = match db.insert_transaction(account_id, import_id, &tx).unwrap() {
        hearth_core::db::TransactionInsertResult::Inserted(id) => id,
        hearth_core::db::TransactionInsertResult::Duplicate(id) => id,
    };
    (account_id, tx_id)
}

// ========== Account Command Tests ==========

#[test]
fn test_cmd_accounts_add_and_list() {
    let (db, hh) = setup_test_db();
    commands::cmd_accounts_add(&db, hh, "Checking", Some("bofa")).unwrap();

    let accounts = db.list_bank_accounts(hh).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].display_name, "Checking");

    assert!(commands::cmd_accounts_list(&db, hh).is_ok());
}

#[test]
fn test_cmd_categories_add() {
    let (db, hh) = setup_test_db();
    commands::cmd_categories_add(&db, hh, "Gifts").unwrap();
    assert!(db.category_by_name(hh, "Gifts").unwrap().is_some());
    assert!(commands::cmd_categories_list(&db, hh).is_ok());
}

// ========== Review Command Tests ==========

#[test]
fn test_cmd_review_assigns_and_marks() {
    let (db, hh) = setup_test_db();
    let (_, tx_id) = create_test_transaction(&db, hh, "CHIPOTLE 1234", -12.50);

    commands::cmd_review(&db, tx_id, "Dining").unwrap();

    let tx = db.get_transaction(tx_id).unwrap();
    assert!(tx.is_reviewed);
    let dining = db.category_by_name(hh, "Dining").unwrap().unwrap();
    assert_eq!(tx.category_id, Some(dining.id));
}

#[test]
fn test_cmd_review_missing_transaction() {
    let (db, _) = setup_test_db();
    assert!(commands::cmd_review(&db, 9999, "Dining").is_err());
}

// ========== Rules Command Tests ==========

#[test]
fn test_cmd_rules_add_and_list() {
    let (db, hh) = setup_test_db();
    commands::cmd_rules_add(&db, hh, r"\bNETFLIX\b", "Subscriptions", 10).unwrap();

    let rules = db.list_rules(hh).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].priority, 10);

    assert!(commands::cmd_rules_list(&db, hh).is_ok());
}

#[test]
fn test_cmd_rules_add_invalid_pattern() {
    let (db, hh) = setup_test_db();
    let result = commands::cmd_rules_add(&db, hh, r"[unclosed", "Subscriptions", 10);
    assert!(result.is_err());
    assert!(db.list_rules(hh).unwrap().is_empty());
}

#[test]
fn test_cmd_rules_enable_disable_delete() {
    let (db, hh) = setup_test_db();
    commands::cmd_rules_add(&db, hh, r"\bNETFLIX\b", "Subscriptions", 10).unwrap();
    let id = db.list_rules(hh).unwrap()[0].id;

    commands::cmd_rules_enable(&db, id, false).unwrap();
    assert!(db.enabled_rules(hh).unwrap().is_empty());

    commands::cmd_rules_enable(&db, id, true).unwrap();
    assert_eq!(db.enabled_rules(hh).unwrap().len(), 1);

    commands::cmd_rules_delete(&db, id).unwrap();
    assert!(db.list_rules(hh).unwrap().is_empty());
}

#[test]
fn test_cmd_rules_test_runs() {
    let (db, hh) = setup_test_db();
    commands::cmd_rules_add(&db, hh, r"\bNETFLIX\b", "Subscriptions", 10).unwrap();
    assert!(commands::cmd_rules_test(&db, hh, "NETFLIX.COM 866-579").is_ok());
    assert!(commands::cmd_rules_test(&db, hh, "nothing matches this").is_ok());
}

// ========== Pipeline Command Tests ==========

#[test]
fn test_cmd_mine_and_recategorize() {
    let (db, hh) = setup_test_db();
    let dining = db.category_by_name(hh, "Dining").unwrap().unwrap();

    for _ in 0..5 {
        let (_, tx_id) = create_test_transaction(&db, hh, "CHIPOTLE ONLINE", -12.50);
        db.review_transaction(tx_id, dining.id).unwrap();
    }
    let (_, fresh_id) = create_test_transaction(&db, hh, "CHIPOTLE 0042", -11.00);

    commands::cmd_mine_rules(&db, hh).unwrap();
    commands::cmd_recategorize(&db, hh).unwrap();

    let fresh = db.get_transaction(fresh_id).unwrap();
    assert_eq!(fresh.category_id, Some(dining.id));
}

#[test]
fn test_cmd_status_runs() {
    let (db, hh) = setup_test_db();
    create_test_transaction(&db, hh, "NETFLIX.COM", -15.49);
    assert!(commands::cmd_status(&db, hh).is_ok());
}

// ========== Train Command Tests ==========

#[test]
fn test_cmd_train_insufficient_data() {
    let (db, hh) = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let store = commands::model_store(Some(dir.path()));

    let result = commands::cmd_train(&db, &store, hh, "logreg", 5, false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_train_rejects_unknown_model() {
    let (db, hh) = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let store = commands::model_store(Some(dir.path()));

    let result = commands::cmd_train(&db, &store, hh, "transformer", 5, false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_predict_without_model() {
    let (db, hh) = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let store = commands::model_store(Some(dir.path()));

    assert!(commands::cmd_predict(&db, &store, hh, "NETFLIX", 3).is_err());
}

#[test]
fn test_cmd_retrain_skips_when_quiet() {
    let (db, hh) = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let store = commands::model_store(Some(dir.path()));

    // No labeled data at all: nothing new, nothing to do
    assert!(commands::cmd_retrain(&db, &store, hh, 50).is_ok());
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly ten", 11), "exactly ten");
    assert_eq!(truncate("a longer string here", 10), "a longe...");
}
