//! Rule management, mining and recategorization commands

use anyhow::Result;
use hearth_core::db::Database;
use hearth_core::maintenance::{backfill_merchant_keys, recategorize};
use hearth_core::merchant::extract_merchant_key;
use hearth_core::mining::mine_rules;

pub fn cmd_rules_list(db: &Database, household_id: i64) -> Result<()> {
    let rules = db.list_rules(household_id)?;
    if rules.is_empty() {
        println!("No rules. Add one with: hearth rules add <pattern> <category>");
        return Ok(());
    }

    println!("{:<6} {:<6} {:<4} {:<14} PATTERN", "ID", "PRIO", "ON", "CATEGORY");
    for rule in rules {
        let category = match rule.category_id {
            Some(id) => db.get_category(id).map(|c| c.name).unwrap_or_default(),
            None => "-".to_string(),
        };
        println!(
            "{:<6} {:<6} {:<4} {:<14} {}",
            rule.id,
            rule.priority,
            if rule.enabled { "✓" } else { "" },
            category,
            rule.pattern,
        );
    }
    Ok(())
}

pub fn cmd_rules_add(
    db: &Database,
    household_id: i64,
    pattern: &str,
    category_name: &str,
    priority: i64,
) -> Result<()> {
    // Reject unusable patterns up front; the engine would skip them anyway
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()?;

    let category_id = db.get_or_create_category(household_id, category_name)?;
    let id = db.create_rule(household_id, pattern, category_id, priority)?;
    println!("✅ Rule {} -> '{}' (priority {})", id, category_name, priority);
    Ok(())
}

pub fn cmd_rules_delete(db: &Database, id: i64) -> Result<()> {
    db.delete_rule(id)?;
    println!("✅ Deleted rule {}", id);
    Ok(())
}

pub fn cmd_rules_enable(db: &Database, id: i64, enabled: bool) -> Result<()> {
    db.set_rule_enabled(id, enabled)?;
    println!(
        "✅ Rule {} {}",
        id,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub fn cmd_rules_test(db: &Database, household_id: i64, description: &str) -> Result<()> {
    println!("Merchant key: {}", extract_merchant_key(description));

    let search_text = description.to_uppercase();
    for rule in db.enabled_rules(household_id)? {
        let re = match regex::RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re,
            Err(_) => continue,
        };
        if re.is_match(&search_text) {
            let category = match rule.category_id {
                Some(id) => db.get_category(id).map(|c| c.name).unwrap_or_default(),
                None => "-".to_string(),
            };
            println!(
                "Matched rule {} (priority {}): {} -> '{}'",
                rule.id, rule.priority, rule.pattern, category
            );
            return Ok(());
        }
    }
    println!("No rule matched.");
    Ok(())
}

pub fn cmd_mine_rules(db: &Database, household_id: i64) -> Result<()> {
    println!("⛏️  Mining rules from reviewed transactions...");
    let summary = mine_rules(db, household_id)?;
    println!("   Candidates: {}", summary.candidates);
    println!("   Created:    {}", summary.created);
    println!("   Updated:    {}", summary.updated);
    if summary.candidates == 0 {
        println!("   Tip: review more transactions first (hearth review <id> <category>)");
    }
    Ok(())
}

pub fn cmd_recategorize(db: &Database, household_id: i64) -> Result<()> {
    println!("🔄 Recategorizing unreviewed transactions...");
    let backfilled = backfill_merchant_keys(db, household_id)?;
    if backfilled > 0 {
        println!("   Backfilled {} merchant key(s)", backfilled);
    }
    let summary = recategorize(db, household_id)?;
    println!("   Scanned: {}", summary.scanned);
    println!("   Updated: {}", summary.updated);
    Ok(())
}
