//! Statement import, transaction listing and review commands

use std::path::Path;

use anyhow::{Context, Result};
use hearth_core::db::Database;
use hearth_core::ingest::ingest_import;
use hearth_core::ml::ModelStore;

use super::truncate;

pub fn cmd_import(
    db: &Database,
    store: &dyn ModelStore,
    file: &Path,
    account_id: i64,
    bank: Option<&str>,
) -> Result<()> {
    let account = db.get_bank_account(account_id)?;
    println!(
        "📄 Importing {} into '{}'...",
        file.display(),
        account.display_name
    );

    let stored_path = file
        .canonicalize()
        .with_context(|| format!("Statement file not found: {}", file.display()))?;
    let filename = file.file_name().and_then(|n| n.to_str());

    let import_id = db.create_import(
        account_id,
        filename,
        stored_path.to_str(),
        bank,
    )?;

    let summary = ingest_import(db, import_id, Some(store))?;

    println!("   Imported: {}", summary.imported);
    println!("   Skipped:  {} (duplicates)", summary.skipped);
    if summary.ml_categorized > 0 {
        println!("   Classified: {} (by model)", summary.ml_categorized);
    }
    if !summary.warnings.is_empty() {
        println!("   ⚠️  {} warning(s):", summary.warnings.len());
        for warning in &summary.warnings {
            println!("      {}", warning);
        }
    }
    println!("✅ Import {} complete", import_id);
    Ok(())
}

pub fn cmd_transactions_list(
    db: &Database,
    account_id: i64,
    limit: i64,
    offset: i64,
) -> Result<()> {
    let transactions = db.list_transactions(account_id, limit, offset)?;
    if transactions.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:>10}  {:<12} {:<4} {}",
        "ID", "DATE", "AMOUNT", "MERCHANT", "REV", "DESCRIPTION"
    );
    for tx in transactions {
        let category = match tx.category_id {
            Some(id) => db.get_category(id).map(|c| c.name).unwrap_or_default(),
            None => "-".to_string(),
        };
        println!(
            "{:<6} {:<12} {:>10.2}  {:<12} {:<4} {}  [{}]",
            tx.id,
            tx.posted_date,
            tx.amount,
            truncate(tx.merchant_key.as_deref().unwrap_or("-"), 12),
            if tx.is_reviewed { "✓" } else { "" },
            truncate(&tx.description, 40),
            category,
        );
    }
    Ok(())
}

pub fn cmd_review(db: &Database, transaction_id: i64, category_name: &str) -> Result<()> {
    let tx = db.get_transaction(transaction_id)?;
    let account = db.get_bank_account(tx.bank_account_id)?;
    let category_id = db.get_or_create_category(account.household_id, category_name)?;

    db.review_transaction(transaction_id, category_id)?;
    println!(
        "✅ Transaction {} -> '{}' (reviewed)",
        transaction_id, category_name
    );
    Ok(())
}
