//! Bank of America statement parser
//!
//! BofA statements lay transactions out in date / description / amount
//! tables under "Deposits and other additions" and "Withdrawals and other
//! subtractions" headings. The parser walks each page's lines with a small
//! state machine: section headings flip the sign convention, a leading date
//! starts a new row, and undated lines continue the previous row's wrapped
//! description.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use lopdf::Document;
use regex::Regex;
use tracing::debug;

use super::{layout, ParseOutcome, StatementParser};
use crate::error::Result;
use crate::models::ParsedTransaction;

const DEPOSIT_MARKERS: &[&str] = &["deposits and other additions", "deposits"];
const WITHDRAWAL_MARKERS: &[&str] = &[
    "withdrawals and other subtractions",
    "other subtractions",
    "withdrawals",
    "checks paid",
];
const SECTION_END_MARKERS: &[&str] = &[
    "total deposits",
    "total withdrawals",
    "total other",
    "ending balance",
    "total checks",
];
const SKIP_KEYWORDS: &[&str] = &[
    "ending balance",
    "beginning balance",
    "subtotal",
    "continued",
    "page",
    "statement period",
];

/// Words-on-the-same-line y tolerance, in PDF points
const LINE_TOLERANCE: f64 = 3.0;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}/\d{1,2}(?:/\d{2,4})?)$").expect("valid regex"));
static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\$?[\d,]+\.\d{2}$|^\([\d,]+\.\d{2}\)$").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Deposits,
    Withdrawals,
}

pub struct BofaParser;

impl StatementParser for BofaParser {
    fn bank_code(&self) -> &'static str {
        "bofa"
    }

    fn parse(&self, pdf_bytes: &[u8]) -> Result<ParseOutcome> {
        let mut outcome = ParseOutcome::default();

        let doc = match Document::load_mem(pdf_bytes) {
            Ok(doc) => doc,
            Err(e) => {
                // A statement that cannot be opened produces warnings, not
                // a hard failure, so a batch with one bad file still runs.
                outcome.warnings.push(format!("Failed to parse PDF: {}", e));
                return Ok(outcome);
            }
        };

        for (page_num, (_, page_id)) in doc.get_pages().into_iter().enumerate() {
            let page_num = page_num + 1;
            let words = match layout::extract_page_words(&doc, page_id) {
                Ok(words) => words,
                Err(e) => {
                    outcome
                        .warnings
                        .push(format!("Page {}: failed to extract text: {}", page_num, e));
                    continue;
                }
            };
            parse_page(&words, page_num, &mut outcome);
        }

        debug!(
            transactions = outcome.transactions.len(),
            warnings = outcome.warnings.len(),
            "parsed BofA statement"
        );
        Ok(outcome)
    }
}

fn parse_page(words: &[layout::Word], page_num: usize, outcome: &mut ParseOutcome) {
    let lines = layout::group_into_lines(words, LINE_TOLERANCE);

    let mut section: Option<Section> = None;
    let mut row: Vec<String> = Vec::new();
    let mut row_date: Option<NaiveDate> = None;

    let flush =
        |row: &mut Vec<String>, date: &mut Option<NaiveDate>, section: Option<Section>, outcome: &mut ParseOutcome| {
            if let (Some(d), Some(s)) = (*date, section) {
                if !row.is_empty() {
                    if let Some(txn) = parse_row(d, row, s, page_num, &mut outcome.warnings) {
                        outcome.transactions.push(txn);
                    }
                }
            }
            row.clear();
            *date = None;
        };

    for line_words in &lines {
        let line_text = line_words.join(" ");
        let line_lower = line_text.to_lowercase();

        if DEPOSIT_MARKERS.iter().any(|m| line_lower.contains(m)) {
            flush(&mut row, &mut row_date, section, outcome);
            section = Some(Section::Deposits);
            continue;
        }
        if WITHDRAWAL_MARKERS.iter().any(|m| line_lower.contains(m)) {
            flush(&mut row, &mut row_date, section, outcome);
            section = Some(Section::Withdrawals);
            continue;
        }
        if SECTION_END_MARKERS.iter().any(|m| line_lower.contains(m)) {
            flush(&mut row, &mut row_date, section, outcome);
            section = None;
            continue;
        }

        if section.is_none() {
            continue;
        }

        if SKIP_KEYWORDS.iter().any(|kw| line_lower.contains(kw)) {
            continue;
        }

        let first_word = line_words.first().map(String::as_str).unwrap_or("");
        if let Some(m) = DATE_PATTERN.captures(first_word) {
            flush(&mut row, &mut row_date, section, outcome);
            row_date = parse_date(&m[1], page_num, &mut outcome.warnings);
            row = line_words[1..].to_vec();
        } else {
            // Wrapped description continues the previous row
            row.extend(line_words.iter().cloned());
        }
    }

    flush(&mut row, &mut row_date, section, outcome);
}

fn parse_date(date_str: &str, page_num: usize, warnings: &mut Vec<String>) -> Option<NaiveDate> {
    let parsed = if date_str.len() > 5 {
        let year_digits = date_str.rsplit('/').next().map(str::len).unwrap_or(0);
        if year_digits == 4 {
            NaiveDate::parse_from_str(date_str, "%m/%d/%Y")
        } else {
            NaiveDate::parse_from_str(date_str, "%m/%d/%y")
        }
    } else {
        // MM/DD with no year: assume the current year
        let with_year = format!("{}/{}", date_str, Utc::now().year());
        NaiveDate::parse_from_str(&with_year, "%m/%d/%Y")
    };

    match parsed {
        Ok(d) => Some(d),
        Err(_) => {
            warnings.push(format!("Page {}: could not parse date: {}", page_num, date_str));
            None
        }
    }
}

fn parse_row(
    posted_date: NaiveDate,
    row_words: &[String],
    section: Section,
    page_num: usize,
    warnings: &mut Vec<String>,
) -> Option<ParsedTransaction> {
    if row_words.is_empty() {
        return None;
    }

    // Amount is the rightmost numeric column
    let found = row_words.iter().enumerate().rev().find_map(|(i, word)| {
        let word = word.trim();
        if AMOUNT_PATTERN.is_match(word) {
            parse_amount(word).map(|a| (i, a))
        } else {
            None
        }
    });
    let (amount_idx, mut amount) = match found {
        Some(v) => v,
        None => {
            warnings.push(format!(
                "Page {}: could not find amount in row: {}",
                page_num,
                row_words.join(" ")
            ));
            return None;
        }
    };

    let description = row_words[..amount_idx].join(" ").trim().to_string();
    if description.is_empty() {
        warnings.push(format!(
            "Page {}: empty description for amount {:.2}",
            page_num, amount
        ));
        return None;
    }

    match section {
        Section::Deposits => amount = amount.abs(),
        Section::Withdrawals => {
            if amount > 0.0 {
                amount = -amount;
            }
        }
    }

    Some(ParsedTransaction {
        posted_date,
        description,
        amount,
    })
}

fn parse_amount(amount_str: &str) -> Option<f64> {
    let cleaned = amount_str.replace(['$', ','], "");
    let cleaned = if cleaned.starts_with('(') && cleaned.ends_with(')') {
        format!("-{}", &cleaned[1..cleaned.len() - 1])
    } else {
        cleaned
    };
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a one-or-more-page PDF where each page is a list of
    /// (text, x, y) words.
    pub(crate) fn build_pdf(pages: &[Vec<(&str, f64, f64)>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page_words in pages {
            let mut operations = Vec::new();
            for (text, x, y) in page_words {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Real(*x as f32), Object::Real(*y as f32)],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Lay out a page of lines as words spaced across a row, top-down.
    pub(crate) fn page_of_lines(lines: &[&str]) -> Vec<(&'static str, f64, f64)> {
        // leak is fine in tests; keeps the helper signature simple
        let mut words = Vec::new();
        let mut y = 750.0;
        for line in lines {
            let mut x = 50.0;
            for word in line.split_whitespace() {
                let leaked: &'static str = Box::leak(word.to_string().into_boxed_str());
                words.push((leaked, x, y));
                x += 60.0;
            }
            y -= 20.0;
        }
        words
    }

    fn parse_lines(lines: &[&str]) -> ParseOutcome {
        let pdf = build_pdf(&[page_of_lines(lines)]);
        BofaParser.parse(&pdf).unwrap()
    }

    #[test]
    fn test_parses_deposit_and_withdrawal_sections() {
        let outcome = parse_lines(&[
            "Deposits and other additions",
            "01/05/2024 PAYROLL ACME CORP 2,500.00",
            "Total deposits and other additions",
            "Withdrawals and other subtractions",
            "01/07/2024 NETFLIX.COM 15.49",
            "01/09/2024 COSTCO WHSE #0482 123.45",
            "Total withdrawals and other subtractions",
        ]);

        assert_eq!(outcome.transactions.len(), 3);
        let payroll = &outcome.transactions[0];
        assert_eq!(payroll.description, "PAYROLL ACME CORP");
        assert_eq!(payroll.amount, 2500.00);
        assert_eq!(
            payroll.posted_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );

        // Withdrawals come out negative
        assert_eq!(outcome.transactions[1].amount, -15.49);
        assert_eq!(outcome.transactions[2].amount, -123.45);
    }

    #[test]
    fn test_wrapped_description_continues_row() {
        let outcome = parse_lines(&[
            "Withdrawals and other subtractions",
            "01/07/2024 CHECKCARD 0105 SOME VERY LONG",
            "MERCHANT NAME CITY CA 45.00",
            "Total withdrawals",
        ]);

        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(
            outcome.transactions[0].description,
            "CHECKCARD 0105 SOME VERY LONG MERCHANT NAME CITY CA"
        );
        assert_eq!(outcome.transactions[0].amount, -45.00);
    }

    #[test]
    fn test_rows_outside_sections_ignored() {
        let outcome = parse_lines(&[
            "01/05/2024 NOT IN A SECTION 10.00",
            "Deposits and other additions",
            "01/06/2024 REAL DEPOSIT 20.00",
            "Total deposits",
        ]);

        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].description, "REAL DEPOSIT");
    }

    #[test]
    fn test_skip_keywords_filtered() {
        let outcome = parse_lines(&[
            "Withdrawals and other subtractions",
            "Statement period 01/01/2024 to 01/31/2024",
            "01/07/2024 NETFLIX.COM 15.49",
            "Total withdrawals",
        ]);

        assert_eq!(outcome.transactions.len(), 1);
    }

    #[test]
    fn test_row_without_amount_warns() {
        let outcome = parse_lines(&[
            "Withdrawals and other subtractions",
            "01/07/2024 NETFLIX.COM 15.49",
            "Total withdrawals",
        ]);
        assert!(outcome.warnings.is_empty());

        let broken = parse_lines(&[
            "Withdrawals and other subtractions",
            "01/07/2024 NO AMOUNT HERE",
            "01/08/2024 NETFLIX.COM 15.49",
            "Total withdrawals",
        ]);
        // Row without an amount warns and drops; good row survives
        assert_eq!(broken.transactions.len(), 1);
        assert_eq!(broken.warnings.len(), 1);
    }

    #[test]
    fn test_parenthesized_and_dollar_amounts() {
        assert_eq!(parse_amount("(123.45)"), Some(-123.45));
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("-15.49"), Some(-15.49));
    }

    #[test]
    fn test_two_digit_year_and_current_year_default() {
        let mut warnings = Vec::new();
        assert_eq!(
            parse_date("01/05/24", 1, &mut warnings),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        let current = parse_date("01/05", 1, &mut warnings).unwrap();
        assert_eq!(current.year(), Utc::now().year());
        assert!(warnings.is_empty());

        assert_eq!(parse_date("13/45/2024", 1, &mut warnings), None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_garbage_bytes_yield_warning_not_error() {
        let outcome = BofaParser.parse(b"not a pdf").unwrap();
        assert!(outcome.transactions.is_empty());
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn test_multi_page_statement() {
        let page1 = page_of_lines(&[
            "Withdrawals and other subtractions",
            "01/07/2024 NETFLIX.COM 15.49",
        ]);
        let page2 = page_of_lines(&[
            "Withdrawals and other subtractions continued",
            "01/09/2024 SPOTIFY USA 9.99",
            "Total withdrawals",
        ]);
        let pdf = build_pdf(&[page1, page2]);
        let outcome = BofaParser.parse(&pdf).unwrap();

        // Section state resets per page; the continuation heading re-enters it
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[1].amount, -9.99);
    }
}
