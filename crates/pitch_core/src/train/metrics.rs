//! Evaluation metrics and report types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fraction of exact matches. `None` on empty input.
pub fn accuracy(truth: &[u32], predicted: &[u32]) -> Option<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return None;
    }
    let hits = truth
        .iter()
        .zip(predicted)
        .filter(|(a, b)| a == b)
        .count();
    Some(hits as f64 / truth.len() as f64)
}

/// Indices of the `k` largest values, descending, ties resolved toward the
/// lower index.
pub fn top_k_indices(values: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));
    indices.truncate(k);
    indices
}

/// Fraction of rows whose true class appears in the top `k` of its
/// probability vector. `None` on empty input.
pub fn top_k_accuracy(truth: &[u32], probabilities: &[Vec<f64>], k: usize) -> Option<f64> {
    if truth.is_empty() || truth.len() != probabilities.len() {
        return None;
    }
    let hits = truth
        .iter()
        .zip(probabilities)
        .filter(|(label, probs)| top_k_indices(probs, k).contains(&(**label as usize)))
        .count();
    Some(hits as f64 / truth.len() as f64)
}

/// Root mean squared error, uniformly averaged over every output of every
/// row. `None` on empty or mismatched input.
pub fn rmse(truth: &[Vec<f64>], predicted: &[Vec<f64>]) -> Option<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return None;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for (t, p) in truth.iter().zip(predicted) {
        if t.len() != p.len() {
            return None;
        }
        for (a, b) in t.iter().zip(p) {
            let diff = a - b;
            sum += diff * diff;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some((sum / count as f64).sqrt())
}

/// Per-class precision, recall, and F1, with zero divisions guarded to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Holdout evaluation of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub top3_accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    pub n_train: usize,
    pub n_test: usize,
}

impl ClassificationReport {
    /// Build from holdout predictions. `labels` maps class codes to names;
    /// classes absent from the holdout still appear with zero support.
    pub fn from_predictions(
        truth: &[u32],
        predicted: &[u32],
        probabilities: &[Vec<f64>],
        labels: &[String],
        n_train: usize,
    ) -> Self {
        let n_classes = labels.len();
        let mut true_positives = vec![0usize; n_classes];
        let mut predicted_counts = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        for (t, p) in truth.iter().zip(predicted) {
            let (t, p) = (*t as usize, *p as usize);
            if t < n_classes {
                support[t] += 1;
            }
            if p < n_classes {
                predicted_counts[p] += 1;
            }
            if t == p && t < n_classes {
                true_positives[t] += 1;
            }
        }

        let per_class = labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let tp = true_positives[index] as f64;
                let precision = if predicted_counts[index] > 0 {
                    tp / predicted_counts[index] as f64
                } else {
                    0.0
                };
                let recall = if support[index] > 0 {
                    tp / support[index] as f64
                } else {
                    0.0
                };
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support: support[index],
                }
            })
            .collect();

        Self {
            accuracy: accuracy(truth, predicted).unwrap_or(0.0),
            top3_accuracy: top_k_accuracy(truth, probabilities, 3).unwrap_or(0.0),
            per_class,
            n_train,
            n_test: truth.len(),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12}  {:>9}  {:>9}  {:>9}  {:>8}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &self.per_class {
            writeln!(
                f,
                "{:>12}  {:>9.2}  {:>9.2}  {:>9.2}  {:>8}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "accuracy: {:.4}  top-3 accuracy: {:.4}  (train {} / test {})",
            self.accuracy, self.top3_accuracy, self.n_train, self.n_test
        )
    }
}

/// Holdout evaluation of a trained location regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub rmse: f64,
    pub n_train: usize,
    pub n_test: usize,
}

impl fmt::Display for RegressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rmse: {:.4} ft  (train {} / test {})",
            self.rmse, self.n_train, self.n_test
        )
    }
}
