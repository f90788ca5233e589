//! Import record operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::ImportRecord;

impl Database {
    /// Create an import record ahead of ingestion
    pub fn create_import(
        &self,
        bank_account_id: i64,
        original_filename: Option<&str>,
        stored_path: Option<&str>,
        bank_code: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO imports (bank_account_id, original_filename, stored_path, bank_code)
             VALUES (?, ?, ?, ?)",
            params![bank_account_id, original_filename, stored_path, bank_code],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record the final counters for an import
    pub fn update_import_counts(
        &self,
        import_id: i64,
        imported: i64,
        skipped: i64,
        warnings: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE imports SET imported_count = ?, skipped_count = ?, warning_count = ?
             WHERE id = ?",
            params![imported, skipped, warnings, import_id],
        )?;
        Ok(())
    }

    /// Get an import record by id
    pub fn get_import(&self, id: i64) -> Result<ImportRecord> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, bank_account_id, original_filename, stored_path, bank_code,
                    imported_count, skipped_count, warning_count, created_at
             FROM imports WHERE id = ?",
            params![id],
            |row| {
                Ok(ImportRecord {
                    id: row.get(0)?,
                    bank_account_id: row.get(1)?,
                    original_filename: row.get(2)?,
                    stored_path: row.get(3)?,
                    bank_code: row.get(4)?,
                    imported_count: row.get(5)?,
                    skipped_count: row.get(6)?,
                    warning_count: row.get(7)?,
                    created_at: parse_datetime(&row.get::<_, String>(8)?),
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("import {}", id)))
    }

    /// List imports for a bank account, newest first
    pub fn list_imports(&self, bank_account_id: i64) -> Result<Vec<ImportRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, bank_account_id, original_filename, stored_path, bank_code,
                    imported_count, skipped_count, warning_count, created_at
             FROM imports WHERE bank_account_id = ? ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![bank_account_id], |row| {
            Ok(ImportRecord {
                id: row.get(0)?,
                bank_account_id: row.get(1)?,
                original_filename: row.get(2)?,
                stored_path: row.get(3)?,
                bank_code: row.get(4)?,
                imported_count: row.get(5)?,
                skipped_count: row.get(6)?,
                warning_count: row.get(7)?,
                created_at: parse_datetime(&row.get::<_, String>(8)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
