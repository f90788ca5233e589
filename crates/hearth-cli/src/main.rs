//! Hearth CLI - Household budgeting from bank statements
//!
//! Usage:
//!   hearth init                      Initialize database and household
//!   hearth import --file PDF -a 1    Import a bank statement
//!   hearth review 42 Groceries       Categorize and mark reviewed
//!   hearth mine-rules                Mine rules from reviewed transactions
//!   hearth train                     Train the transaction classifier

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init { name } => commands::cmd_init(&cli.db, &name, cli.no_encrypt),
        Commands::Status => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_status(&db, cli.household)
        }
        Commands::Accounts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(AccountsAction::List) => commands::cmd_accounts_list(&db, cli.household),
                Some(AccountsAction::Add { name, bank }) => {
                    commands::cmd_accounts_add(&db, cli.household, &name, bank.as_deref())
                }
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(CategoriesAction::List) => {
                    commands::cmd_categories_list(&db, cli.household)
                }
                Some(CategoriesAction::Add { name }) => {
                    commands::cmd_categories_add(&db, cli.household, &name)
                }
            }
        }
        Commands::Import {
            file,
            account,
            bank,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let store = commands::model_store(cli.models_dir.as_deref());
            commands::cmd_import(&db, &store, &file, account, bank.as_deref())
        }
        Commands::Transactions {
            account,
            limit,
            offset,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_transactions_list(&db, account, limit, offset)
        }
        Commands::Review {
            transaction_id,
            category,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_review(&db, transaction_id, &category)
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&db, cli.household),
                Some(RulesAction::Add {
                    pattern,
                    category,
                    priority,
                }) => commands::cmd_rules_add(&db, cli.household, &pattern, &category, priority),
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&db, id),
                Some(RulesAction::Enable { id, off }) => commands::cmd_rules_enable(&db, id, !off),
                Some(RulesAction::Test { description }) => {
                    commands::cmd_rules_test(&db, cli.household, &description)
                }
            }
        }
        Commands::MineRules => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_mine_rules(&db, cli.household)
        }
        Commands::Recategorize => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_recategorize(&db, cli.household)
        }
        Commands::Train {
            model,
            min_count,
            include_income,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let store = commands::model_store(cli.models_dir.as_deref());
            commands::cmd_train(&db, &store, cli.household, &model, min_count, include_income)
        }
        Commands::Predict { text, top_k } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let store = commands::model_store(cli.models_dir.as_deref());
            commands::cmd_predict(&db, &store, cli.household, &text, top_k)
        }
        Commands::Retrain { min_new } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let store = commands::model_store(cli.models_dir.as_deref());
            commands::cmd_retrain(&db, &store, cli.household, min_new)
        }
    }
}
