//! Text featurization: tokenization and TF-IDF vectors
//!
//! Feature vectors are sparse (index, weight) pairs over a vocabulary of
//! unigrams and bigrams learned at fit time. Weights are smoothed TF-IDF,
//! L2-normalized per document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Lowercase word tokens of length >= 2
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Unigrams plus adjacent-pair bigrams ("blue bottle")
fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut grams: Vec<String> = tokens.to_vec();
    for pair in tokens.windows(2) {
        grams.push(format!("{} {}", pair[0], pair[1]));
    }
    grams
}

/// A fitted TF-IDF vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    /// Terms must appear in at least this many documents
    min_df: usize,
}

impl Vectorizer {
    /// Learn the vocabulary and document frequencies from a corpus.
    pub fn fit(texts: &[String], min_df: usize) -> Self {
        let n_docs = texts.len();

        // Document frequency per term
        let mut df: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let mut seen: Vec<String> = ngrams(&tokenize(text));
            seen.sort();
            seen.dedup();
            for gram in seen {
                *df.entry(gram).or_insert(0) += 1;
            }
        }

        // Keep terms meeting min_df; sort for a stable index assignment
        let mut kept: Vec<(String, usize)> = df
            .into_iter()
            .filter(|(_, count)| *count >= min_df)
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (i, (gram, count)) in kept.into_iter().enumerate() {
            vocabulary.insert(gram, i);
            // Smoothed idf: ln((1 + n) / (1 + df)) + 1
            idf.push(((1 + n_docs) as f64 / (1 + count) as f64).ln() + 1.0);
        }

        Self {
            vocabulary,
            idf,
            min_df,
        }
    }

    /// Number of features
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    /// Map a text to a sparse, L2-normalized TF-IDF vector.
    pub fn transform(&self, text: &str) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in ngrams(&tokenize(text)) {
            if let Some(&idx) = self.vocabulary.get(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vec: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm: f64 = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vec {
                *w /= norm;
            }
        }
        vec.sort_by_key(|(idx, _)| *idx);
        vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("NETFLIX.COM 866-579-7172"),
            vec!["netflix", "com", "866", "579", "7172"]
        );
    }

    #[test]
    fn test_tokenize_drops_single_chars() {
        assert_eq!(tokenize("a bb c dd"), vec!["bb", "dd"]);
    }

    #[test]
    fn test_min_df_filters_rare_terms() {
        let texts = vec![
            "netflix subscription".to_string(),
            "netflix streaming".to_string(),
            "one off merchant".to_string(),
        ];
        let v = Vectorizer::fit(&texts, 2);
        // Only "netflix" appears in two documents
        assert_eq!(v.dim(), 1);
        assert!(!v.transform("netflix").is_empty());
        assert!(v.transform("streaming").is_empty());
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let texts = vec![
            "blue bottle coffee".to_string(),
            "blue bottle oakland".to_string(),
        ];
        let v = Vectorizer::fit(&texts, 2);
        let vec = v.transform("blue bottle coffee");
        let norm: f64 = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bigrams_included() {
        let texts = vec![
            "blue bottle one".to_string(),
            "blue bottle two".to_string(),
        ];
        let v = Vectorizer::fit(&texts, 2);
        // "blue", "bottle" and "blue bottle" all hit min_df
        assert_eq!(v.dim(), 3);
    }

    #[test]
    fn test_unseen_text_is_empty_vector() {
        let texts = vec!["netflix".to_string(), "netflix".to_string()];
        let v = Vectorizer::fit(&texts, 2);
        assert!(v.transform("totally different").is_empty());
    }

    #[test]
    fn test_roundtrip_serde() {
        let texts = vec!["netflix com".to_string(), "netflix com".to_string()];
        let v = Vectorizer::fit(&texts, 2);
        let json = serde_json::to_string(&v).unwrap();
        let back: Vectorizer = serde_json::from_str(&json).unwrap();
        assert_eq!(v.transform("netflix com"), back.transform("netflix com"));
    }
}
