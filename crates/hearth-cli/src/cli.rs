//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hearth - Household budgeting from bank statements
#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Self-hosted household budgeting pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "hearth.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set HEARTH_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Household to operate on
    #[arg(long, default_value = "1", global = true)]
    pub household: i64,

    /// Directory for trained model artifacts
    ///
    /// Defaults to the platform data directory, e.g.
    /// ~/.local/share/hearth/models on Linux.
    #[arg(long, global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database, a household and default categories
    Init {
        /// Household name
        #[arg(long, default_value = "Home")]
        name: String,
    },

    /// Show database status (households, accounts, transaction counts)
    Status,

    /// Manage bank accounts
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Import a PDF bank statement
    Import {
        /// Statement PDF to import
        #[arg(short, long)]
        file: PathBuf,

        /// Bank account to import into
        #[arg(short, long)]
        account: i64,

        /// Bank code (defaults to the account's bank code)
        #[arg(short, long)]
        bank: Option<String>,
    },

    /// List transactions for an account
    Transactions {
        /// Bank account
        #[arg(short, long)]
        account: i64,

        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: i64,
    },

    /// Assign a category to a transaction and mark it reviewed
    Review {
        /// Transaction id
        transaction_id: i64,

        /// Category name (created if missing)
        category: String,
    },

    /// Manage categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Mine rules from reviewed transactions
    MineRules,

    /// Re-run categorization over unreviewed transactions
    Recategorize,

    /// Train the transaction classifier
    Train {
        /// Model flavor: logreg or svm
        #[arg(long, default_value = "logreg")]
        model: String,

        /// Drop categories with fewer than this many examples
        #[arg(long, default_value = "5")]
        min_count: usize,

        /// Include deposits in the training corpus
        #[arg(long)]
        include_income: bool,
    },

    /// Predict categories for a description
    Predict {
        /// Transaction description to classify
        text: String,

        /// Number of predictions to show
        #[arg(short = 'k', long, default_value = "3")]
        top_k: usize,
    },

    /// Retrain the classifier if enough new examples accumulated
    Retrain {
        /// Minimum new labeled examples since the last training run
        #[arg(long, default_value = "50")]
        min_new: i64,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List bank accounts (default)
    List,

    /// Add a bank account
    Add {
        /// Display name
        name: String,

        /// Bank code for statement parsing, e.g. "bofa"
        #[arg(short, long)]
        bank: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories (default)
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules (default)
    List,

    /// Add a rule
    Add {
        /// Regex pattern matched against the description
        pattern: String,

        /// Category name (created if missing)
        category: String,

        /// Priority, lower runs first
        #[arg(short, long, default_value = "100")]
        priority: i64,
    },

    /// Delete a rule
    Delete {
        /// Rule id
        id: i64,
    },

    /// Enable or disable a rule
    Enable {
        /// Rule id
        id: i64,

        /// Disable instead of enable
        #[arg(long)]
        off: bool,
    },

    /// Test which rule matches a description
    Test {
        /// Description to test
        description: String,
    },
}
