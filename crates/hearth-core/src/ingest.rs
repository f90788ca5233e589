//! Statement ingestion
//!
//! Drives one import end to end: load the stored statement, parse it with
//! the account's bank parser, then fingerprint, dedup, merchant-key and
//! categorize each candidate before insert. Counters land back on the
//! import record.

use std::collections::HashSet;
use std::fs;

use tracing::{debug, info, warn};

use crate::categorize::categorize_transaction;
use crate::db::{Database, TransactionInsertResult};
use crate::error::{Error, Result};
use crate::fingerprint::fingerprint;
use crate::merchant::{extract_display_name, extract_merchant_key, UNKNOWN_MERCHANT};
use crate::ml::{self, ModelStore, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::models::NewTransaction;
use crate::parse::parser_for;

/// What one ingestion run did
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub imported: usize,
    pub skipped: usize,
    /// Uncategorized transactions the classifier filled in afterwards
    pub ml_categorized: usize,
    pub warnings: Vec<String>,
}

/// Ingest the statement behind an import record.
///
/// Duplicates are skipped two ways: against fingerprints already seen in
/// this batch (statements repeat rows across page boundaries) and against
/// the transactions table. When a model store is supplied, transactions
/// that merchants/overrides/rules left uncategorized get a classifier
/// pass, applied only above the confidence threshold.
pub fn ingest_import(
    db: &Database,
    import_id: i64,
    ml_store: Option<&dyn ModelStore>,
) -> Result<IngestSummary> {
    let import = db.get_import(import_id)?;
    let account = db.get_bank_account(import.bank_account_id)?;

    let stored_path = import
        .stored_path
        .as_deref()
        .ok_or_else(|| Error::Import(format!("import {} has no stored file", import_id)))?;

    let bank_code = import
        .bank_code
        .as_deref()
        .or(account.bank_code.as_deref())
        .ok_or_else(|| {
            Error::InvalidData(format!(
                "import {} has no bank code and account '{}' has none either",
                import_id, account.display_name
            ))
        })?;

    let pdf_bytes = fs::read(stored_path)
        .map_err(|e| Error::Import(format!("cannot read stored file {}: {}", stored_path, e)))?;

    let parser = parser_for(bank_code)?;
    let outcome = parser.parse(&pdf_bytes)?;

    let mut summary = IngestSummary {
        warnings: outcome.warnings,
        ..Default::default()
    };

    let mut seen_fingerprints: HashSet<String> = HashSet::new();
    let mut uncategorized: Vec<(i64, String)> = Vec::new();

    for parsed in &outcome.transactions {
        let fp = fingerprint(parsed.posted_date, parsed.amount, &parsed.description);
        if !seen_fingerprints.insert(fp.clone()) {
            summary.skipped += 1;
            continue;
        }

        let merchant_key = extract_merchant_key(&parsed.description);
        let merchant_id = if merchant_key != UNKNOWN_MERCHANT {
            Some(db.get_or_create_merchant(
                account.household_id,
                &merchant_key,
                &extract_display_name(&parsed.description),
            )?)
        } else {
            None
        };

        let category_id = categorize_transaction(
            db,
            account.household_id,
            &parsed.description,
            merchant_id,
            Some(&merchant_key),
        )?;

        let tx = NewTransaction {
            posted_date: parsed.posted_date,
            description: parsed.description.clone(),
            merchant_key: Some(merchant_key.clone()),
            amount: parsed.amount,
            category_id,
            fingerprint: fp,
        };

        match db.insert_transaction(import.bank_account_id, import_id, &tx)? {
            TransactionInsertResult::Inserted(id) => {
                summary.imported += 1;
                if category_id.is_none() {
                    // Same text shape the classifier was trained on
                    let text = format!("{} {}", merchant_key, parsed.description);
                    uncategorized.push((id, text.trim().to_string()));
                }
            }
            TransactionInsertResult::Duplicate(_) => summary.skipped += 1,
        }
    }

    if let Some(store) = ml_store {
        for (id, text) in &uncategorized {
            if let Some((category_id, confidence)) = ml::suggest_category(
                store,
                account.household_id,
                text,
                DEFAULT_CONFIDENCE_THRESHOLD,
            )? {
                db.set_transaction_category(*id, Some(category_id))?;
                summary.ml_categorized += 1;
                debug!(transaction_id = id, category_id, confidence, "classifier fallback applied");
            }
        }
    }

    db.update_import_counts(
        import_id,
        summary.imported as i64,
        summary.skipped as i64,
        summary.warnings.len() as i64,
    )?;

    if !summary.warnings.is_empty() {
        warn!(
            import_id,
            warnings = summary.warnings.len(),
            "statement parsed with warnings"
        );
    }
    info!(
        import_id,
        imported = summary.imported,
        skipped = summary.skipped,
        "ingestion complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::bofa::tests::{build_pdf, page_of_lines};

    /// Write a small BofA-shaped statement to disk and register an import
    /// pointing at it.
    fn statement_import(db: &Database, dir: &std::path::Path) -> (i64, i64, i64) {
        let hh = db.create_household("test").unwrap();
        let account = db.create_bank_account(hh, "Checking", Some("bofa")).unwrap();

        let pdf = build_pdf(&[page_of_lines(&[
            "Deposits and other additions",
            "01/05/2024 PAYROLL ACME CORP 2,500.00",
            "Total deposits and other additions 2,500.00",
            "Withdrawals and other subtractions",
            "01/07/2024 NETFLIX.COM 866-579-7172 15.49",
            "01/09/2024 COSTCO WHSE #0482 SEATTLE WA 183.20",
            "Total withdrawals and other subtractions 198.69",
        ])]);
        let path = dir.join("statement.pdf");
        fs::write(&path, pdf).unwrap();

        let import_id = db
            .create_import(
                account,
                Some("statement.pdf"),
                Some(path.to_str().unwrap()),
                Some("bofa"),
            )
            .unwrap();
        (hh, account, import_id)
    }

    #[test]
    fn test_ingest_imports_transactions() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (_, account, import_id) = statement_import(&db, dir.path());

        let summary = ingest_import(&db, import_id, None).unwrap();
        assert_eq!(summary.imported, 3);
        assert_eq!(summary.skipped, 0);
        assert!(summary.warnings.is_empty());

        let txns = db.list_transactions(account, 10, 0).unwrap();
        assert_eq!(txns.len(), 3);
        let costco = txns
            .iter()
            .find(|t| t.description.contains("COSTCO"))
            .unwrap();
        assert_eq!(costco.amount, -183.20);
        assert_eq!(costco.merchant_key.as_deref(), Some("COSTCO"));
        let payroll = txns
            .iter()
            .find(|t| t.description.contains("PAYROLL"))
            .unwrap();
        assert_eq!(payroll.amount, 2500.00);

        // Counters recorded on the import row
        let record = db.get_import(import_id).unwrap();
        assert_eq!(record.imported_count, 3);
        assert_eq!(record.skipped_count, 0);
    }

    #[test]
    fn test_reingest_skips_all_duplicates() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (_, account, import_id) = statement_import(&db, dir.path());

        ingest_import(&db, import_id, None).unwrap();

        // Same file registered again: every row is a known fingerprint
        let record = db.get_import(import_id).unwrap();
        let second = db
            .create_import(
                account,
                record.original_filename.as_deref(),
                record.stored_path.as_deref(),
                Some("bofa"),
            )
            .unwrap();
        let summary = ingest_import(&db, second, None).unwrap();
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.skipped, 3);
        assert_eq!(db.list_transactions(account, 10, 0).unwrap().len(), 3);
    }

    #[test]
    fn test_ingest_categorizes_on_insert() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (hh, account, import_id) = statement_import(&db, dir.path());

        let subs = db.get_or_create_category(hh, "Subscriptions").unwrap();
        db.create_rule(hh, r"\bNETFLIX\b", subs, 10).unwrap();

        ingest_import(&db, import_id, None).unwrap();

        let txns = db.list_transactions(account, 10, 0).unwrap();
        let netflix = txns
            .iter()
            .find(|t| t.description.contains("NETFLIX"))
            .unwrap();
        assert_eq!(netflix.category_id, Some(subs));
        assert!(!netflix.is_reviewed);
    }

    #[test]
    fn test_ingest_creates_merchants() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (hh, _, import_id) = statement_import(&db, dir.path());

        ingest_import(&db, import_id, None).unwrap();

        let merchants = db.list_merchants(hh).unwrap();
        assert!(merchants.iter().any(|m| m.merchant_key == "COSTCO"));
        assert!(merchants.iter().any(|m| m.merchant_key == "NETFLIX"));
    }

    #[test]
    fn test_ml_fallback_fills_uncategorized() {
        use crate::ml::linear::LogisticRegression;
        use crate::ml::text::Vectorizer;
        use crate::ml::{FsModelStore, ModelArtifact, ModelKind, ModelMetadata};
        use crate::models::ModelType;

        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (hh, account, import_id) = statement_import(&db, dir.path());
        let groceries = db.get_or_create_category(hh, "Groceries").unwrap();
        let subs = db.get_or_create_category(hh, "Subscriptions").unwrap();

        // A tiny model that separates costco from spotify perfectly
        let texts = vec![
            "costco whse".to_string(),
            "costco whse".to_string(),
            "spotify usa".to_string(),
            "spotify usa".to_string(),
        ];
        let vectorizer = Vectorizer::fit(&texts, 2);
        let xs: Vec<_> = texts.iter().map(|t| vectorizer.transform(t)).collect();
        let model = LogisticRegression::fit(
            &xs,
            &[0, 0, 1, 1],
            vec![groceries, subs],
            vectorizer.dim(),
        );
        let store = FsModelStore::new(dir.path().join("models"));
        store
            .save(
                hh,
                &ModelArtifact {
                    vectorizer,
                    model: ModelKind::Logreg(model),
                },
                &ModelMetadata {
                    household_id: hh,
                    model_type: ModelType::Logreg,
                    categories: vec![groceries, subs],
                    n_examples: 4,
                    accuracy: 1.0,
                    last_trained_at: "2024-01-01T00:00:00Z".to_string(),
                    last_example_count: 4,
                },
            )
            .unwrap();

        let summary = ingest_import(&db, import_id, Some(&store)).unwrap();
        assert_eq!(summary.imported, 3);
        assert_eq!(summary.ml_categorized, 1);

        let txns = db.list_transactions(account, 10, 0).unwrap();
        let costco = txns
            .iter()
            .find(|t| t.description.contains("COSTCO"))
            .unwrap();
        assert_eq!(costco.category_id, Some(groceries));
        // Unknown vocabulary stays below the confidence floor
        let netflix = txns
            .iter()
            .find(|t| t.description.contains("NETFLIX"))
            .unwrap();
        assert_eq!(netflix.category_id, None);
    }

    #[test]
    fn test_missing_stored_path() {
        let db = Database::in_memory().unwrap();
        let hh = db.create_household("test").unwrap();
        let account = db.create_bank_account(hh, "Checking", Some("bofa")).unwrap();
        let import_id = db.create_import(account, None, None, Some("bofa")).unwrap();

        let err = ingest_import(&db, import_id, None).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }

    #[test]
    fn test_missing_file_on_disk() {
        let db = Database::in_memory().unwrap();
        let hh = db.create_household("test").unwrap();
        let account = db.create_bank_account(hh, "Checking", Some("bofa")).unwrap();
        let import_id = db
            .create_import(account, None, Some("/nonexistent/statement.pdf"), Some("bofa"))
            .unwrap();

        let err = ingest_import(&db, import_id, None).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }

    #[test]
    fn test_bank_code_falls_back_to_account() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let hh = db.create_household("test").unwrap();
        let account = db.create_bank_account(hh, "Checking", Some("bofa")).unwrap();

        let pdf = build_pdf(&[page_of_lines(&[
            "Withdrawals and other subtractions",
            "02/01/2024 SPOTIFY USA 11.99",
            "Total withdrawals and other subtractions 11.99",
        ])]);
        let path = dir.path().join("s.pdf");
        fs::write(&path, pdf).unwrap();

        // Import carries no bank code of its own
        let import_id = db
            .create_import(account, None, Some(path.to_str().unwrap()), None)
            .unwrap();
        let summary = ingest_import(&db, import_id, None).unwrap();
        assert_eq!(summary.imported, 1);
    }

    #[test]
    fn test_garbage_pdf_warns_but_succeeds() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let hh = db.create_household("test").unwrap();
        let account = db.create_bank_account(hh, "Checking", Some("bofa")).unwrap();

        let path = dir.path().join("bad.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();
        let import_id = db
            .create_import(account, None, Some(path.to_str().unwrap()), Some("bofa"))
            .unwrap();

        let summary = ingest_import(&db, import_id, None).unwrap();
        assert_eq!(summary.imported, 0);
        assert!(!summary.warnings.is_empty());
        assert_eq!(db.get_import(import_id).unwrap().warning_count, 1);
    }
}
