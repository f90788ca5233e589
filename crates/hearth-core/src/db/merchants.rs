//! Merchant and merchant override operations

use rusqlite::{params, OptionalExtension, Row};

use super::{is_unique_violation, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Merchant, MerchantOverride};

fn map_merchant(row: &Row<'_>) -> rusqlite::Result<Merchant> {
    Ok(Merchant {
        id: row.get(0)?,
        household_id: row.get(1)?,
        merchant_key: row.get(2)?,
        display_name: row.get(3)?,
        default_category_id: row.get(4)?,
        confidence: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

const MERCHANT_COLUMNS: &str =
    "id, household_id, merchant_key, display_name, default_category_id, confidence, created_at";

impl Database {
    /// Get a merchant by key, creating it if missing.
    pub fn get_or_create_merchant(
        &self,
        household_id: i64,
        merchant_key: &str,
        display_name: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM merchants WHERE household_id = ? AND merchant_key = ?",
                params![household_id, merchant_key],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let inserted = conn.execute(
            "INSERT INTO merchants (household_id, merchant_key, display_name) VALUES (?, ?, ?)",
            params![household_id, merchant_key, display_name],
        );

        match inserted {
            Ok(_) => Ok(conn.last_insert_rowid()),
            // A racing create for the same key: use the row that won
            Err(e) if is_unique_violation(&e) => Ok(conn.query_row(
                "SELECT id FROM merchants WHERE household_id = ? AND merchant_key = ?",
                params![household_id, merchant_key],
                |row| row.get(0),
            )?),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a merchant by id
    pub fn get_merchant(&self, id: i64) -> Result<Merchant> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM merchants WHERE id = ?", MERCHANT_COLUMNS),
            params![id],
            map_merchant,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("merchant {}", id)))
    }

    /// Look up a merchant by its normalized key
    pub fn merchant_by_key(&self, household_id: i64, merchant_key: &str) -> Result<Option<Merchant>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM merchants WHERE household_id = ? AND merchant_key = ?",
                    MERCHANT_COLUMNS
                ),
                params![household_id, merchant_key],
                map_merchant,
            )
            .optional()?)
    }

    /// Set a merchant's default category and confidence
    pub fn set_merchant_category(
        &self,
        merchant_id: i64,
        category_id: Option<i64>,
        confidence: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE merchants SET default_category_id = ?, confidence = ? WHERE id = ?",
            params![category_id, confidence, merchant_id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("merchant {}", merchant_id)));
        }
        Ok(())
    }

    /// List merchants in a household
    pub fn list_merchants(&self, household_id: i64) -> Result<Vec<Merchant>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM merchants WHERE household_id = ? ORDER BY merchant_key",
            MERCHANT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![household_id], map_merchant)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Upsert a merchant override
    pub fn set_merchant_override(
        &self,
        household_id: i64,
        merchant_key: &str,
        category_id: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO merchant_overrides (household_id, merchant_key, category_id)
             VALUES (?, ?, ?)
             ON CONFLICT(household_id, merchant_key) DO UPDATE SET category_id = excluded.category_id",
            params![household_id, merchant_key, category_id],
        )?;
        Ok(())
    }

    /// Look up a merchant override by key
    pub fn merchant_override(
        &self,
        household_id: i64,
        merchant_key: &str,
    ) -> Result<Option<MerchantOverride>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, household_id, merchant_key, category_id
                 FROM merchant_overrides WHERE household_id = ? AND merchant_key = ?",
                params![household_id, merchant_key],
                |row| {
                    Ok(MerchantOverride {
                        id: row.get(0)?,
                        household_id: row.get(1)?,
                        merchant_key: row.get(2)?,
                        category_id: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }
}
