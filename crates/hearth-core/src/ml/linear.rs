//! Linear classifiers over sparse TF-IDF features
//!
//! Two flavors, both trained by plain gradient descent with dense weight
//! matrices (vocabulary sizes here are small):
//!
//! - [`LogisticRegression`]: multinomial softmax, calibrated probabilities
//! - [`LinearSvm`]: one-vs-rest hinge loss, raw decision margins

use serde::{Deserialize, Serialize};

/// Sparse feature vector as produced by the vectorizer
pub type SparseVec = Vec<(usize, f64)>;

const EPOCHS: usize = 200;
const LEARNING_RATE: f64 = 0.5;
const L2_PENALTY: f64 = 1e-4;

fn dot(weights: &[f64], x: &SparseVec) -> f64 {
    x.iter().map(|&(idx, v)| weights[idx] * v).sum()
}

fn softmax(scores: &mut [f64]) {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        sum += *s;
    }
    for s in scores.iter_mut() {
        *s /= sum;
    }
}

/// Multinomial logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// One weight row per class
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    /// Category ids, aligned with weight rows
    pub classes: Vec<i64>,
}

impl LogisticRegression {
    /// Fit by full-batch softmax gradient descent.
    ///
    /// `labels` are indices into `classes`.
    pub fn fit(xs: &[SparseVec], labels: &[usize], classes: Vec<i64>, dim: usize) -> Self {
        let k = classes.len();
        let mut weights = vec![vec![0.0; dim]; k];
        let mut bias = vec![0.0; k];
        let n = xs.len() as f64;

        for _ in 0..EPOCHS {
            let mut grad_w = vec![vec![0.0; dim]; k];
            let mut grad_b = vec![0.0; k];

            for (x, &label) in xs.iter().zip(labels) {
                let mut scores: Vec<f64> = (0..k).map(|c| dot(&weights[c], x) + bias[c]).collect();
                softmax(&mut scores);

                for c in 0..k {
                    let err = scores[c] - if c == label { 1.0 } else { 0.0 };
                    for &(idx, v) in x {
                        grad_w[c][idx] += err * v;
                    }
                    grad_b[c] += err;
                }
            }

            for c in 0..k {
                for (w, g) in weights[c].iter_mut().zip(&grad_w[c]) {
                    *w -= LEARNING_RATE * (g / n + L2_PENALTY * *w);
                }
                bias[c] -= LEARNING_RATE * grad_b[c] / n;
            }
        }

        Self {
            weights,
            bias,
            classes,
        }
    }

    /// Class probabilities, aligned with `classes`
    pub fn predict_proba(&self, x: &SparseVec) -> Vec<f64> {
        let mut scores: Vec<f64> = (0..self.classes.len())
            .map(|c| dot(&self.weights[c], x) + self.bias[c])
            .collect();
        softmax(&mut scores);
        scores
    }

    pub fn predict(&self, x: &SparseVec) -> i64 {
        let probs = self.predict_proba(x);
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.classes[best]
    }
}

/// One-vs-rest linear SVM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    pub classes: Vec<i64>,
}

impl LinearSvm {
    /// Fit one hinge-loss binary separator per class.
    pub fn fit(xs: &[SparseVec], labels: &[usize], classes: Vec<i64>, dim: usize) -> Self {
        let k = classes.len();
        let mut weights = vec![vec![0.0; dim]; k];
        let mut bias = vec![0.0; k];
        let n = xs.len() as f64;

        for c in 0..k {
            for _ in 0..EPOCHS {
                let mut grad_w = vec![0.0; dim];
                let mut grad_b = 0.0;

                for (x, &label) in xs.iter().zip(labels) {
                    let y = if label == c { 1.0 } else { -1.0 };
                    let margin = y * (dot(&weights[c], x) + bias[c]);
                    if margin < 1.0 {
                        for &(idx, v) in x {
                            grad_w[idx] -= y * v;
                        }
                        grad_b -= y;
                    }
                }

                for (w, g) in weights[c].iter_mut().zip(&grad_w) {
                    *w -= LEARNING_RATE * (g / n + L2_PENALTY * *w);
                }
                bias[c] -= LEARNING_RATE * grad_b / n;
            }
        }

        Self {
            weights,
            bias,
            classes,
        }
    }

    /// Raw decision margins, aligned with `classes`.
    ///
    /// Not probabilities: useful only for ranking.
    pub fn decision(&self, x: &SparseVec) -> Vec<f64> {
        (0..self.classes.len())
            .map(|c| dot(&self.weights[c], x) + self.bias[c])
            .collect()
    }

    pub fn predict(&self, x: &SparseVec) -> i64 {
        let scores = self.decision(x);
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.classes[best]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two clearly separated classes on two features
    fn toy_data() -> (Vec<SparseVec>, Vec<usize>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for _ in 0..10 {
            xs.push(vec![(0, 1.0)]);
            ys.push(0);
            xs.push(vec![(1, 1.0)]);
            ys.push(1);
        }
        (xs, ys)
    }

    #[test]
    fn test_logreg_separates_toy_data() {
        let (xs, ys) = toy_data();
        let model = LogisticRegression::fit(&xs, &ys, vec![100, 200], 2);
        assert_eq!(model.predict(&vec![(0, 1.0)]), 100);
        assert_eq!(model.predict(&vec![(1, 1.0)]), 200);
    }

    #[test]
    fn test_logreg_probabilities_sum_to_one() {
        let (xs, ys) = toy_data();
        let model = LogisticRegression::fit(&xs, &ys, vec![100, 200], 2);
        let probs = model.predict_proba(&vec![(0, 1.0)]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_svm_separates_toy_data() {
        let (xs, ys) = toy_data();
        let model = LinearSvm::fit(&xs, &ys, vec![100, 200], 2);
        assert_eq!(model.predict(&vec![(0, 1.0)]), 100);
        assert_eq!(model.predict(&vec![(1, 1.0)]), 200);
    }

    #[test]
    fn test_svm_decision_ranks_true_class_first() {
        let (xs, ys) = toy_data();
        let model = LinearSvm::fit(&xs, &ys, vec![100, 200], 2);
        let scores = model.decision(&vec![(1, 1.0)]);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_three_class_logreg() {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for _ in 0..10 {
            for c in 0..3usize {
                xs.push(vec![(c, 1.0)]);
                ys.push(c);
            }
        }
        let model = LogisticRegression::fit(&xs, &ys, vec![7, 8, 9], 3);
        assert_eq!(model.predict(&vec![(2, 1.0)]), 9);
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let (xs, ys) = toy_data();
        let model = LogisticRegression::fit(&xs, &ys, vec![100, 200], 2);
        let json = serde_json::to_string(&model).unwrap();
        let back: LogisticRegression = serde_json::from_str(&json).unwrap();
        assert_eq!(model.predict(&vec![(0, 1.0)]), back.predict(&vec![(0, 1.0)]));
    }
}
