//! Category operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};
use crate::models::Category;

/// Categories seeded into a fresh household
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Income",
    "Transfer",
    "Groceries",
    "Dining",
    "Utilities",
    "Rent/Mortgage",
    "Transport",
    "Shopping",
    "Subscriptions",
    "Health",
    "Kids",
    "Entertainment",
    "Travel",
    "Fees",
];

impl Database {
    /// Get a category by name or create it.
    pub fn get_or_create_category(&self, household_id: i64, name: &str) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE household_id = ? AND name = ?",
                params![household_id, name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO categories (household_id, name) VALUES (?, ?)",
            params![household_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Seed the default category set; returns how many were newly created.
    pub fn seed_default_categories(&self, household_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let mut created = 0;
        for name in DEFAULT_CATEGORIES {
            let n = conn.execute(
                "INSERT OR IGNORE INTO categories (household_id, name) VALUES (?, ?)",
                params![household_id, name],
            )?;
            created += n;
        }
        Ok(created)
    }

    /// Get a category by id
    pub fn get_category(&self, id: i64) -> Result<Category> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, household_id, name FROM categories WHERE id = ?",
            params![id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    household_id: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    /// Look up a category by name within a household
    pub fn category_by_name(&self, household_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, household_id, name FROM categories
                 WHERE household_id = ? AND name = ?",
                params![household_id, name],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        household_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// List categories in a household
    pub fn list_categories(&self, household_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, household_id, name FROM categories WHERE household_id = ? ORDER BY name",
        )?;
        let rows = stmt.query_map(params![household_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                household_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
