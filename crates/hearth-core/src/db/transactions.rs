//! Transaction operations

use rusqlite::{params, OptionalExtension, Row};

use super::{is_unique_violation, parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

/// Result of inserting a transaction
#[derive(Debug, Clone)]
pub enum TransactionInsertResult {
    /// Transaction was inserted, contains new transaction ID
    Inserted(i64),
    /// Transaction fingerprint already existed, contains existing ID
    Duplicate(i64),
}

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        bank_account_id: row.get(1)?,
        import_id: row.get(2)?,
        posted_date: parse_date(&row.get::<_, String>(3)?),
        description: row.get(4)?,
        merchant_key: row.get(5)?,
        amount: row.get(6)?,
        category_id: row.get(7)?,
        fingerprint: row.get(8)?,
        is_reviewed: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

const TXN_COLUMNS: &str = "id, bank_account_id, import_id, posted_date, description, \
                           merchant_key, amount, category_id, fingerprint, is_reviewed, created_at";

impl Database {
    /// Insert a transaction, skipping duplicates by fingerprint.
    ///
    /// The fingerprint column also carries a UNIQUE constraint; a racing
    /// insert that lands between the lookup and the INSERT comes back as
    /// `Duplicate`, same as one caught by the lookup.
    pub fn insert_transaction(
        &self,
        bank_account_id: i64,
        import_id: i64,
        tx: &NewTransaction,
    ) -> Result<TransactionInsertResult> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE fingerprint = ?",
                params![tx.fingerprint],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing_id) = existing {
            return Ok(TransactionInsertResult::Duplicate(existing_id));
        }

        let inserted = conn.execute(
            r#"
            INSERT INTO transactions
                (bank_account_id, import_id, posted_date, description, merchant_key,
                 amount, category_id, fingerprint, is_reviewed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
            params![
                bank_account_id,
                import_id,
                tx.posted_date.to_string(),
                tx.description,
                tx.merchant_key,
                tx.amount,
                tx.category_id,
                tx.fingerprint,
            ],
        );

        match inserted {
            Ok(_) => Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid())),
            Err(e) if is_unique_violation(&e) => {
                let id: i64 = conn.query_row(
                    "SELECT id FROM transactions WHERE fingerprint = ?",
                    params![tx.fingerprint],
                    |row| row.get(0),
                )?;
                Ok(TransactionInsertResult::Duplicate(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a transaction by id
    pub fn get_transaction(&self, id: i64) -> Result<Transaction> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM transactions WHERE id = ?", TXN_COLUMNS),
            params![id],
            map_transaction,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    /// List transactions for a bank account, newest first
    pub fn list_transactions(
        &self,
        bank_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE bank_account_id = ?
             ORDER BY posted_date DESC, id DESC LIMIT ? OFFSET ?",
            TXN_COLUMNS
        ))?;
        let rows = stmt.query_map(params![bank_account_id, limit, offset], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Set (or clear) a transaction's category
    pub fn set_transaction_category(&self, id: i64, category_id: Option<i64>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET category_id = ? WHERE id = ?",
            params![category_id, id],
        )?;
        Ok(())
    }

    /// Set a transaction's merchant key
    pub fn set_transaction_merchant_key(&self, id: i64, merchant_key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET merchant_key = ? WHERE id = ?",
            params![merchant_key, id],
        )?;
        Ok(())
    }

    /// Record a user review: assign the category and mark reviewed
    pub fn review_transaction(&self, id: i64, category_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE transactions SET category_id = ?, is_reviewed = 1 WHERE id = ?",
            params![category_id, id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Count transactions across a household
    pub fn count_transactions(&self, household_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM transactions t
             JOIN bank_accounts a ON a.id = t.bank_account_id
             WHERE a.household_id = ?",
            params![household_id],
            |row| row.get(0),
        )?)
    }

    /// Reviewed, categorized transactions for rule mining.
    ///
    /// Returns (description, merchant_key, category_id) per transaction.
    pub fn reviewed_examples(
        &self,
        household_id: i64,
    ) -> Result<Vec<(String, Option<String>, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT t.description, t.merchant_key, t.category_id
             FROM transactions t
             JOIN bank_accounts a ON a.id = t.bank_account_id
             WHERE a.household_id = ? AND t.is_reviewed = 1 AND t.category_id IS NOT NULL",
        )?;
        let rows = stmt.query_map(params![household_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Categorized transactions for classifier training.
    ///
    /// Returns (description, merchant_key, category_id) per transaction;
    /// filtering by label or per-category count happens upstream.
    pub fn labeled_transactions(
        &self,
        household_id: i64,
    ) -> Result<Vec<(String, Option<String>, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT t.description, t.merchant_key, t.category_id
             FROM transactions t
             JOIN bank_accounts a ON a.id = t.bank_account_id
             WHERE a.household_id = ? AND t.category_id IS NOT NULL
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![household_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// One batch of transactions needing recategorization, keyed by id cursor.
    ///
    /// Targets uncategorized or unreviewed transactions. Cursor pagination
    /// (rather than OFFSET) keeps the scan stable while rows in the batch
    /// are being updated.
    pub fn recategorize_batch(
        &self,
        household_id: i64,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE id > ?
               AND bank_account_id IN
                   (SELECT id FROM bank_accounts WHERE household_id = ?)
               AND (category_id IS NULL OR is_reviewed = 0)
             ORDER BY id LIMIT ?",
            TXN_COLUMNS
        ))?;
        let rows = stmt.query_map(params![after_id, household_id, limit], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// One batch of transactions without a merchant key, keyed by id cursor
    pub fn missing_merchant_key_batch(
        &self,
        household_id: i64,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE id > ?
               AND bank_account_id IN
                   (SELECT id FROM bank_accounts WHERE household_id = ?)
               AND merchant_key IS NULL
             ORDER BY id LIMIT ?",
            TXN_COLUMNS
        ))?;
        let rows = stmt.query_map(params![after_id, household_id, limit], map_transaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
