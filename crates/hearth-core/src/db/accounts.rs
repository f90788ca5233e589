//! Household and bank account operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{BankAccount, Household};

impl Database {
    /// Create a household
    pub fn create_household(&self, name: &str) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO households (name) VALUES (?)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a household by id
    pub fn get_household(&self, id: i64) -> Result<Household> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, created_at FROM households WHERE id = ?",
            params![id],
            |row| {
                Ok(Household {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("household {}", id)))
    }

    /// Create a bank account within a household
    pub fn create_bank_account(
        &self,
        household_id: i64,
        display_name: &str,
        bank_code: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO bank_accounts (household_id, display_name, bank_code) VALUES (?, ?, ?)",
            params![household_id, display_name, bank_code],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a bank account by id
    pub fn get_bank_account(&self, id: i64) -> Result<BankAccount> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, household_id, bank_code, display_name, created_at
             FROM bank_accounts WHERE id = ?",
            params![id],
            |row| {
                Ok(BankAccount {
                    id: row.get(0)?,
                    household_id: row.get(1)?,
                    bank_code: row.get(2)?,
                    display_name: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("bank account {}", id)))
    }

    /// List bank accounts in a household
    pub fn list_bank_accounts(&self, household_id: i64) -> Result<Vec<BankAccount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, household_id, bank_code, display_name, created_at
             FROM bank_accounts WHERE household_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![household_id], |row| {
            Ok(BankAccount {
                id: row.get(0)?,
                household_id: row.get(1)?,
                bank_code: row.get(2)?,
                display_name: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
