//! Bank statement parsing
//!
//! Each supported bank gets a [`StatementParser`] implementation keyed by a
//! short bank code. Parsers take raw PDF bytes and produce transaction
//! candidates plus human-readable warnings for anything they had to skip.

pub mod bofa;
pub mod layout;

use crate::error::{Error, Result};
use crate::models::ParsedTransaction;

pub use layout::{extract_page_words, group_into_lines, Word};

/// What a parser got out of a statement.
///
/// Parsers are lenient: malformed rows become warnings, not errors, so a
/// partially damaged statement still yields its readable transactions.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub transactions: Vec<ParsedTransaction>,
    pub warnings: Vec<String>,
}

/// A bank-specific statement parser
pub trait StatementParser {
    /// Short identifier used to select this parser, e.g. "bofa"
    fn bank_code(&self) -> &'static str;

    /// Parse raw PDF bytes into transaction candidates
    fn parse(&self, pdf_bytes: &[u8]) -> Result<ParseOutcome>;
}

/// Bank codes with a registered parser
pub const SUPPORTED_BANKS: &[&str] = &["bofa"];

/// Look up the parser for a bank code.
pub fn parser_for(bank_code: &str) -> Result<Box<dyn StatementParser>> {
    match bank_code {
        "bofa" => Ok(Box::new(bofa::BofaParser)),
        _ => Err(Error::UnsupportedBank(format!(
            "'{}' (supported: {})",
            bank_code,
            SUPPORTED_BANKS.join(", ")
        ))),
    }
}
