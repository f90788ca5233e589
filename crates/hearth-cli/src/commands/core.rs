//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `model_store` - Shared utility to resolve the model artifact store
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database status

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hearth_core::db::Database;
use hearth_core::ml::FsModelStore;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Resolve the model artifact store from --models-dir or the platform
/// data directory
pub fn model_store(models_dir: Option<&Path>) -> FsModelStore {
    let root = match models_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hearth")
            .join("models"),
    };
    FsModelStore::new(root)
}

pub fn cmd_init(db_path: &Path, name: &str, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let household_id = db
        .create_household(name)
        .context("Failed to create household")?;
    let seeded = db
        .seed_default_categories(household_id)
        .context("Failed to seed default categories")?;
    println!("   Created household '{}' (id {})", name, household_id);
    println!("   Seeded {} default categories", seeded);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an account: hearth accounts add Checking --bank bofa");
    println!("  2. Import a statement: hearth import --file statement.pdf --account 1");

    Ok(())
}

pub fn cmd_status(db: &Database, household_id: i64) -> Result<()> {
    let household = db.get_household(household_id)?;
    let accounts = db.list_bank_accounts(household_id)?;
    let categories = db.list_categories(household_id)?;
    let merchants = db.list_merchants(household_id)?;
    let rules = db.list_rules(household_id)?;
    let transactions = db.count_transactions(household_id)?;

    println!("🏠 Household: {} (id {})", household.name, household.id);
    println!("   Accounts:     {}", accounts.len());
    println!("   Transactions: {}", transactions);
    println!("   Categories:   {}", categories.len());
    println!("   Merchants:    {}", merchants.len());
    println!("   Rules:        {}", rules.len());
    println!("   Database:     {}", db.path());

    Ok(())
}
