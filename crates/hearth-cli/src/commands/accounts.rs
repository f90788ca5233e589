//! Bank account and category management commands

use anyhow::Result;
use hearth_core::db::Database;

pub fn cmd_accounts_list(db: &Database, household_id: i64) -> Result<()> {
    let accounts = db.list_bank_accounts(household_id)?;
    if accounts.is_empty() {
        println!("No accounts. Add one with: hearth accounts add <name> --bank bofa");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<8}", "ID", "NAME", "BANK");
    for account in accounts {
        println!(
            "{:<6} {:<24} {:<8}",
            account.id,
            account.display_name,
            account.bank_code.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn cmd_accounts_add(
    db: &Database,
    household_id: i64,
    name: &str,
    bank: Option<&str>,
) -> Result<()> {
    let id = db.create_bank_account(household_id, name, bank)?;
    println!("✅ Created account '{}' (id {})", name, id);
    if bank.is_none() {
        println!("   Note: no bank code set; imports will need --bank");
    }
    Ok(())
}

pub fn cmd_categories_list(db: &Database, household_id: i64) -> Result<()> {
    let categories = db.list_categories(household_id)?;
    if categories.is_empty() {
        println!("No categories. Run: hearth init");
        return Ok(());
    }

    println!("{:<6} NAME", "ID");
    for category in categories {
        println!("{:<6} {}", category.id, category.name);
    }
    Ok(())
}

pub fn cmd_categories_add(db: &Database, household_id: i64, name: &str) -> Result<()> {
    let id = db.get_or_create_category(household_id, name)?;
    println!("✅ Category '{}' (id {})", name, id);
    Ok(())
}
