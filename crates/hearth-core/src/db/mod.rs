//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Households and bank accounts
//! - `categories` - Spending categories and defaults
//! - `imports` - Statement upload records and counters
//! - `transactions` - Transaction insert/dedup and queries
//! - `merchants` - Merchants and merchant overrides
//! - `rules` - Regex categorization rules

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod accounts;
mod categories;
mod imports;
mod merchants;
mod rules;
mod transactions;

pub use rules::RuleUpsertResult;
pub use transactions::TransactionInsertResult;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "HEARTH_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"hearth-salt-v1-f";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// True when an insert failed on a UNIQUE constraint rather than anything
/// else. Check-then-insert paths use this to fold a racing insert into
/// their lookup branch instead of surfacing a database error.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a stored "YYYY-MM-DD" date
pub(crate) fn parse_date(s: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `HEARTH_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: Only use for development or testing. For real data, use
    /// `new()` with `HEARTH_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        // busy_timeout lets a second writer wait for the WAL lock instead
        // of failing with SQLITE_BUSY
        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let init = format!(
                "PRAGMA key = 'x\"{}\"'; PRAGMA busy_timeout = 5000;",
                key
            );

            // Set the key on every new connection
            let manager = manager.with_init(move |conn| conn.execute_batch(&init));
            Pool::builder().max_size(10).build(manager)?
        } else {
            let manager =
                manager.with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/hearth_test_{}_{}.db", std::process::id(), id);

        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Households (scoping unit for everything below)
            CREATE TABLE IF NOT EXISTS households (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Bank accounts
            CREATE TABLE IF NOT EXISTS bank_accounts (
                id INTEGER PRIMARY KEY,
                household_id INTEGER NOT NULL REFERENCES households(id),
                bank_code TEXT,
                display_name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_bank_accounts_household ON bank_accounts(household_id);

            -- Categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                household_id INTEGER NOT NULL REFERENCES households(id),
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(household_id, name)
            );

            -- Imports (one row per statement upload)
            CREATE TABLE IF NOT EXISTS imports (
                id INTEGER PRIMARY KEY,
                bank_account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
                original_filename TEXT,
                stored_path TEXT,
                bank_code TEXT,
                imported_count INTEGER NOT NULL DEFAULT 0,
                skipped_count INTEGER NOT NULL DEFAULT 0,
                warning_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_imports_account ON imports(bank_account_id);

            -- Transactions
            -- The fingerprint is globally unique: the same (date, amount,
            -- description) uploaded twice collapses to one row.
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                bank_account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
                import_id INTEGER NOT NULL REFERENCES imports(id),
                posted_date DATE NOT NULL,
                description TEXT NOT NULL,
                merchant_key TEXT,
                amount REAL NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                fingerprint TEXT NOT NULL UNIQUE,
                is_reviewed BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(posted_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(bank_account_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(merchant_key);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_import ON transactions(import_id);

            -- Merchants (normalized key, unique per household)
            CREATE TABLE IF NOT EXISTS merchants (
                id INTEGER PRIMARY KEY,
                household_id INTEGER NOT NULL REFERENCES households(id),
                merchant_key TEXT NOT NULL,
                display_name TEXT NOT NULL,
                default_category_id INTEGER REFERENCES categories(id),
                confidence REAL NOT NULL DEFAULT 1.0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(household_id, merchant_key)
            );

            CREATE INDEX IF NOT EXISTS idx_merchants_key ON merchants(merchant_key);

            -- Merchant overrides (legacy key-to-category mapping)
            CREATE TABLE IF NOT EXISTS merchant_overrides (
                id INTEGER PRIMARY KEY,
                household_id INTEGER NOT NULL REFERENCES households(id),
                merchant_key TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(household_id, merchant_key)
            );

            -- Category rules (user-created or mined regex rules)
            CREATE TABLE IF NOT EXISTS category_rules (
                id INTEGER PRIMARY KEY,
                household_id INTEGER NOT NULL REFERENCES households(id),
                pattern TEXT NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                priority INTEGER NOT NULL DEFAULT 100,
                enabled BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(household_id, pattern)
            );

            CREATE INDEX IF NOT EXISTS idx_rules_household ON category_rules(household_id, enabled, priority);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
