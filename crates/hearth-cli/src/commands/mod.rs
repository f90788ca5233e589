//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init/status commands and shared utilities (open_db, model_store)
//! - `accounts` - Bank account and category management
//! - `import` - Statement import, transaction listing and review
//! - `rules` - Rule management, mining and recategorization
//! - `train` - Classifier training and prediction

pub mod accounts;
pub mod core;
pub mod import;
pub mod rules;
pub mod train;

// Re-export command functions for main.rs
pub use accounts::*;
pub use core::*;
pub use import::*;
pub use rules::*;
pub use train::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
