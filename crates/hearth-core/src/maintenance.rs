//! Recategorization sweeps
//!
//! After rules are mined or merchants get default categories, existing
//! transactions are stale. A sweep re-runs the categorization engine over
//! every uncategorized or unreviewed transaction in the household, in
//! id-ordered batches. Reviewed transactions are the user's word and are
//! never touched.

use tracing::info;

use crate::categorize::categorize_transaction;
use crate::db::Database;
use crate::error::Result;
use crate::merchant::extract_merchant_key;

const BATCH_SIZE: i64 = 500;

/// What a recategorization sweep changed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecategorizeSummary {
    pub scanned: usize,
    pub updated: usize,
}

/// Re-run categorization over a household's unreviewed transactions.
pub fn recategorize(db: &Database, household_id: i64) -> Result<RecategorizeSummary> {
    let mut summary = RecategorizeSummary::default();
    let mut cursor = 0i64;

    loop {
        let batch = db.recategorize_batch(household_id, cursor, BATCH_SIZE)?;
        if batch.is_empty() {
            break;
        }

        for tx in &batch {
            cursor = tx.id;
            summary.scanned += 1;

            let new_category = categorize_transaction(
                db,
                household_id,
                &tx.description,
                None,
                tx.merchant_key.as_deref(),
            )?;

            if new_category != tx.category_id {
                if let Some(category_id) = new_category {
                    db.set_transaction_category(tx.id, Some(category_id))?;
                    summary.updated += 1;
                }
                // A vanished match keeps the old category rather than
                // un-categorizing work already done
            }
        }
    }

    info!(
        household_id,
        scanned = summary.scanned,
        updated = summary.updated,
        "recategorization sweep complete"
    );
    Ok(summary)
}

/// Fill in merchant keys for transactions imported before key extraction
/// existed. Returns how many rows were updated.
pub fn backfill_merchant_keys(db: &Database, household_id: i64) -> Result<usize> {
    let mut updated = 0;
    let mut cursor = 0i64;

    loop {
        let batch = db.missing_merchant_key_batch(household_id, cursor, BATCH_SIZE)?;
        if batch.is_empty() {
            break;
        }

        for tx in &batch {
            cursor = tx.id;
            let key = extract_merchant_key(&tx.description);
            db.set_transaction_merchant_key(tx.id, &key)?;
            updated += 1;
        }
    }

    info!(household_id, updated, "merchant key backfill complete");
    Ok(updated)
}
