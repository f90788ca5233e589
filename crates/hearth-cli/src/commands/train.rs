//! Classifier training and prediction commands

use anyhow::{Context, Result};
use hearth_core::db::Database;
use hearth_core::ml::{self, ModelStore, TrainOptions};
use hearth_core::models::ModelType;

pub fn cmd_train(
    db: &Database,
    store: &dyn ModelStore,
    household_id: i64,
    model: &str,
    min_count: usize,
    include_income: bool,
) -> Result<()> {
    let model_type: ModelType = model.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let opts = TrainOptions {
        model_type,
        min_count,
        exclude_income: !include_income,
    };

    println!("🧠 Training {} classifier...", model_type);
    let report = ml::train(db, store, household_id, &opts)
        .context("Training failed")?;

    println!("   Examples:   {} ({} train / {} test)", report.n_examples, report.n_train, report.n_test);
    println!("   Categories: {}", report.categories.len());
    println!("   Accuracy:   {:.1}%", report.accuracy * 100.0);
    println!("✅ Model saved");
    Ok(())
}

pub fn cmd_predict(
    db: &Database,
    store: &dyn ModelStore,
    household_id: i64,
    text: &str,
    top_k: usize,
) -> Result<()> {
    let prediction = ml::predict(store, household_id, text, top_k)?;

    let named: Vec<serde_json::Value> = prediction
        .top_k
        .iter()
        .map(|(category_id, score)| {
            let name = db
                .get_category(*category_id)
                .map(|c| c.name)
                .unwrap_or_else(|_| category_id.to_string());
            serde_json::json!({ "category": name, "score": score })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&named)?);
    Ok(())
}

pub fn cmd_retrain(
    db: &Database,
    store: &dyn ModelStore,
    household_id: i64,
    min_new: i64,
) -> Result<()> {
    let outcome = ml::retrain_if_needed(db, store, household_id, min_new, &TrainOptions::default())?;

    if outcome.retrained {
        println!("✅ Retrained ({} new examples)", outcome.n_new_examples);
        if let Some(meta) = outcome.metadata {
            println!("   Accuracy: {:.1}%", meta.accuracy * 100.0);
        }
    } else {
        println!(
            "⏭️  Skipped: {} new examples since last training (need {})",
            outcome.n_new_examples, min_new
        );
    }
    Ok(())
}
