//! Category rule operations

use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::CategoryRule;

/// Result of upserting a mined rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleUpsertResult {
    Created(i64),
    Updated(i64),
}

fn map_rule(row: &Row<'_>) -> rusqlite::Result<CategoryRule> {
    Ok(CategoryRule {
        id: row.get(0)?,
        household_id: row.get(1)?,
        pattern: row.get(2)?,
        category_id: row.get(3)?,
        priority: row.get(4)?,
        enabled: row.get(5)?,
    })
}

const RULE_COLUMNS: &str = "id, household_id, pattern, category_id, priority, enabled";

impl Database {
    /// Create a rule
    pub fn create_rule(
        &self,
        household_id: i64,
        pattern: &str,
        category_id: i64,
        priority: i64,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO category_rules (household_id, pattern, category_id, priority, enabled)
             VALUES (?, ?, ?, ?, 1)",
            params![household_id, pattern, category_id, priority],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Upsert a rule by pattern; mined rules re-run through here on every
    /// mining pass, refreshing category, priority and enabled state.
    pub fn upsert_rule(
        &self,
        household_id: i64,
        pattern: &str,
        category_id: i64,
        priority: i64,
    ) -> Result<RuleUpsertResult> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM category_rules WHERE household_id = ? AND pattern = ?",
                params![household_id, pattern],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE category_rules SET category_id = ?, priority = ?, enabled = 1
                     WHERE id = ?",
                    params![category_id, priority, id],
                )?;
                Ok(RuleUpsertResult::Updated(id))
            }
            None => {
                conn.execute(
                    "INSERT INTO category_rules (household_id, pattern, category_id, priority, enabled)
                     VALUES (?, ?, ?, ?, 1)",
                    params![household_id, pattern, category_id, priority],
                )?;
                Ok(RuleUpsertResult::Created(conn.last_insert_rowid()))
            }
        }
    }

    /// Enabled rules in evaluation order (priority ascending, then id)
    pub fn enabled_rules(&self, household_id: i64) -> Result<Vec<CategoryRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM category_rules
             WHERE household_id = ? AND enabled = 1
             ORDER BY priority ASC, id ASC",
            RULE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![household_id], map_rule)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// All rules in a household
    pub fn list_rules(&self, household_id: i64) -> Result<Vec<CategoryRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM category_rules WHERE household_id = ? ORDER BY priority ASC, id ASC",
            RULE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![household_id], map_rule)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Enable or disable a rule
    pub fn set_rule_enabled(&self, rule_id: i64, enabled: bool) -> Result<()> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE category_rules SET enabled = ? WHERE id = ?",
            params![enabled, rule_id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("rule {}", rule_id)));
        }
        Ok(())
    }

    /// Delete a rule
    pub fn delete_rule(&self, rule_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM category_rules WHERE id = ?", params![rule_id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("rule {}", rule_id)));
        }
        Ok(())
    }
}
