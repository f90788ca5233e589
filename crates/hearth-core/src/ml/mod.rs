//! Text classifier for transaction categorization
//!
//! Learns a household-scoped model from already-categorized transactions:
//! TF-IDF features over merchant key + description, classified by
//! multinomial logistic regression or a one-vs-rest linear SVM. Artifacts
//! persist per household through a [`ModelStore`].

pub mod linear;
pub mod store;
pub mod text;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ModelType, TrainingExample};
pub use store::{FsModelStore, ModelStore};

/// Minimum labeled transactions before training is allowed
pub const MIN_EXAMPLES: usize = 50;
/// Held-out fraction for the accuracy estimate
pub const TEST_FRACTION: f64 = 0.2;
/// Fixed shuffle seed: identical data trains an identical model
pub const SPLIT_SEED: u64 = 42;
/// Terms must appear in at least this many training texts
const MIN_DF: usize = 2;
/// Confidence floor for auto-suggestions
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Knobs for assembling the training corpus
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub model_type: ModelType,
    /// Drop categories with fewer than this many examples
    pub min_count: usize,
    /// Skip examples labeled with the household's "Income" category
    pub exclude_income: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            model_type: ModelType::Logreg,
            min_count: 5,
            exclude_income: true,
        }
    }
}

/// The fitted classifier flavor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelKind {
    Logreg(linear::LogisticRegression),
    Svm(linear::LinearSvm),
}

/// Everything needed to score new text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub vectorizer: text::Vectorizer,
    pub model: ModelKind,
}

impl ModelArtifact {
    /// Score all categories for a text, best first.
    ///
    /// Logistic regression scores are probabilities; SVM scores are raw
    /// margins, useful only for ranking.
    pub fn predict_scores(&self, input: &str) -> Vec<(i64, f64)> {
        let x = self.vectorizer.transform(input);
        let mut scored: Vec<(i64, f64)> = match &self.model {
            ModelKind::Logreg(m) => m.classes.iter().copied().zip(m.predict_proba(&x)).collect(),
            ModelKind::Svm(m) => m.classes.iter().copied().zip(m.decision(&x)).collect(),
        };
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

/// Model provenance and quality, stored next to the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub household_id: i64,
    pub model_type: ModelType,
    pub categories: Vec<i64>,
    pub n_examples: usize,
    pub accuracy: f64,
    pub last_trained_at: String,
    pub last_example_count: usize,
}

/// What a training run measured
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub n_examples: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub accuracy: f64,
    pub categories: Vec<i64>,
}

/// A ranked prediction for one text
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub category_id: i64,
    pub confidence: f64,
    pub top_k: Vec<(i64, f64)>,
}

/// Outcome of a conditional retrain
#[derive(Debug, Clone)]
pub struct RetrainOutcome {
    pub retrained: bool,
    pub n_new_examples: i64,
    pub metadata: Option<ModelMetadata>,
}

/// Assemble the labeled corpus for a household.
///
/// Income exclusion goes by label, not by amount sign: a positive-amount
/// refund labeled Groceries stays in the corpus, a negative payroll
/// adjustment labeled Income does not.
pub fn gather_training_examples(
    db: &Database,
    household_id: i64,
    opts: &TrainOptions,
) -> Result<Vec<TrainingExample>> {
    let rows = db.labeled_transactions(household_id)?;

    let income_id = if opts.exclude_income {
        db.category_by_name(household_id, "Income")?.map(|c| c.id)
    } else {
        None
    };

    let mut examples: Vec<TrainingExample> = Vec::with_capacity(rows.len());
    for (description, merchant_key, category_id) in rows {
        if income_id == Some(category_id) {
            continue;
        }
        let text = match merchant_key {
            Some(key) => format!("{} {}", key, description),
            None => description,
        };
        examples.push(TrainingExample {
            text: text.trim().to_string(),
            category_id,
        });
    }

    if opts.min_count > 1 {
        let mut counts = std::collections::HashMap::new();
        for ex in &examples {
            *counts.entry(ex.category_id).or_insert(0usize) += 1;
        }
        examples.retain(|ex| counts[&ex.category_id] >= opts.min_count);
    }

    Ok(examples)
}

/// Seeded train/test split, stratified per category when every category
/// has at least two examples, plain otherwise.
fn split_examples(
    examples: &[TrainingExample],
    seed: u64,
) -> (Vec<&TrainingExample>, Vec<&TrainingExample>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut by_category: std::collections::BTreeMap<i64, Vec<&TrainingExample>> =
        std::collections::BTreeMap::new();
    for ex in examples {
        by_category.entry(ex.category_id).or_default().push(ex);
    }

    let stratify = by_category.values().all(|group| group.len() >= 2);
    let mut train = Vec::new();
    let mut test = Vec::new();

    if stratify {
        for group in by_category.values_mut() {
            group.shuffle(&mut rng);
            let n_test = ((group.len() as f64 * TEST_FRACTION).round() as usize)
                .max(1)
                .min(group.len() - 1);
            test.extend(group.iter().copied().take(n_test));
            train.extend(group.iter().copied().skip(n_test));
        }
    } else {
        let mut all: Vec<&TrainingExample> = examples.iter().collect();
        all.shuffle(&mut rng);
        let n_test = ((all.len() as f64 * TEST_FRACTION).round() as usize)
            .max(1)
            .min(all.len() - 1);
        test.extend(all.iter().copied().take(n_test));
        train.extend(all.iter().copied().skip(n_test));
    }

    (train, test)
}

fn fit(
    model_type: ModelType,
    train: &[&TrainingExample],
) -> (text::Vectorizer, ModelKind, Vec<i64>) {
    let texts: Vec<String> = train.iter().map(|ex| ex.text.clone()).collect();
    let vectorizer = text::Vectorizer::fit(&texts, MIN_DF);

    let mut classes: Vec<i64> = train.iter().map(|ex| ex.category_id).collect();
    classes.sort_unstable();
    classes.dedup();

    let xs: Vec<_> = train.iter().map(|ex| vectorizer.transform(&ex.text)).collect();
    let labels: Vec<usize> = train
        .iter()
        .map(|ex| classes.binary_search(&ex.category_id).unwrap_or(0))
        .collect();

    let model = match model_type {
        ModelType::Logreg => ModelKind::Logreg(linear::LogisticRegression::fit(
            &xs,
            &labels,
            classes.clone(),
            vectorizer.dim(),
        )),
        ModelType::Svm => ModelKind::Svm(linear::LinearSvm::fit(
            &xs,
            &labels,
            classes.clone(),
            vectorizer.dim(),
        )),
    };

    (vectorizer, model, classes)
}

/// Train, evaluate and persist a classifier for a household.
pub fn train(
    db: &Database,
    store: &dyn ModelStore,
    household_id: i64,
    opts: &TrainOptions,
) -> Result<TrainReport> {
    let examples = gather_training_examples(db, household_id, opts)?;

    if examples.len() < MIN_EXAMPLES {
        return Err(Error::InsufficientTrainingData(format!(
            "need at least {} categorized transactions, have {}",
            MIN_EXAMPLES,
            examples.len()
        )));
    }

    let mut distinct: Vec<i64> = examples.iter().map(|ex| ex.category_id).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(Error::InsufficientTrainingData(
            "need examples from at least 2 categories".to_string(),
        ));
    }

    let (train_set, test_set) = split_examples(&examples, SPLIT_SEED);
    let (vectorizer, model, categories) = fit(opts.model_type, &train_set);

    let artifact = ModelArtifact { vectorizer, model };

    let correct = test_set
        .iter()
        .filter(|ex| {
            artifact
                .predict_scores(&ex.text)
                .first()
                .map(|(cat, _)| *cat == ex.category_id)
                .unwrap_or(false)
        })
        .count();
    let accuracy = correct as f64 / test_set.len() as f64;

    let metadata = ModelMetadata {
        household_id,
        model_type: opts.model_type,
        categories: categories.clone(),
        n_examples: examples.len(),
        accuracy,
        last_trained_at: Utc::now().to_rfc3339(),
        last_example_count: examples.len(),
    };
    store.save(household_id, &artifact, &metadata)?;

    info!(
        household_id,
        n_examples = examples.len(),
        accuracy,
        model_type = %opts.model_type,
        "classifier trained"
    );

    Ok(TrainReport {
        n_examples: examples.len(),
        n_train: train_set.len(),
        n_test: test_set.len(),
        accuracy,
        categories,
    })
}

/// Predict the top categories for a text.
pub fn predict(
    store: &dyn ModelStore,
    household_id: i64,
    input: &str,
    top_k: usize,
) -> Result<Prediction> {
    let artifact = store
        .load(household_id)?
        .ok_or(Error::ModelNotFound(household_id))?;

    let mut scored = artifact.predict_scores(input);
    let (category_id, confidence) = scored
        .first()
        .copied()
        .ok_or_else(|| Error::Training("model has no classes".to_string()))?;
    scored.truncate(top_k);

    Ok(Prediction {
        category_id,
        confidence,
        top_k: scored,
    })
}

/// Suggest a category only when the model is confident enough.
pub fn suggest_category(
    store: &dyn ModelStore,
    household_id: i64,
    input: &str,
    threshold: f64,
) -> Result<Option<(i64, f64)>> {
    match predict(store, household_id, input, 1) {
        Ok(p) if p.confidence >= threshold => Ok(Some((p.category_id, p.confidence))),
        Ok(_) => Ok(None),
        Err(Error::ModelNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Retrain when enough new labeled examples accumulated since the last run.
pub fn retrain_if_needed(
    db: &Database,
    store: &dyn ModelStore,
    household_id: i64,
    min_new_examples: i64,
    opts: &TrainOptions,
) -> Result<RetrainOutcome> {
    let examples = gather_training_examples(db, household_id, opts)?;
    let n_examples = examples.len() as i64;

    let previous = store.load_metadata(household_id)?;
    let last_count = previous.as_ref().map(|m| m.last_example_count as i64).unwrap_or(0);
    let n_new = n_examples - last_count;

    if n_new >= min_new_examples {
        train(db, store, household_id, opts)?;
        let metadata = store.load_metadata(household_id)?;
        Ok(RetrainOutcome {
            retrained: true,
            n_new_examples: n_new,
            metadata,
        })
    } else {
        Ok(RetrainOutcome {
            retrained: false,
            n_new_examples: n_new,
            metadata: previous,
        })
    }
}
