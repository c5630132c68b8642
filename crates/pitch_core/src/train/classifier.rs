//! Pitch-type classifier training

use serde::{Deserialize, Serialize};

use crate::error::{PitchError, Result};
use crate::features::TrainingSet;
use crate::forest::{fit_classifier, ForestClassifier, ForestConfig};

use super::metrics::ClassificationReport;
use super::split::stratified_split;

/// A frozen classifier plus the ordered label list needed to interpret
/// its probability vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedClassifier {
    pub forest: ForestClassifier,
    /// Position in this list equals position in the probability vector
    pub labels: Vec<String>,
}

impl TrainedClassifier {
    /// Class probabilities in label order.
    pub fn probabilities(&self, features: &[f64]) -> Vec<f64> {
        self.forest.predict_proba(features)
    }

    /// Full distribution as (label, probability) pairs.
    pub fn predict_distribution(&self, features: &[f64]) -> Vec<(String, f64)> {
        let probabilities = self.forest.predict_proba(features);
        self.labels.iter().cloned().zip(probabilities).collect()
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }
}

/// Inverse-class-frequency sample weights: `n / (n_classes * count_c)`.
pub fn balanced_weights(labels: &[u32], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for label in labels {
        let index = *label as usize;
        if index < n_classes {
            counts[index] += 1;
        }
    }
    let n = labels.len() as f64;
    labels
        .iter()
        .map(|label| {
            let count = counts.get(*label as usize).copied().unwrap_or(0);
            if count > 0 {
                n / (n_classes as f64 * count as f64)
            } else {
                0.0
            }
        })
        .collect()
}

/// Train the pitch-type classifier on an engineered training set.
///
/// Holds out a stratified 20% for the report, balances class weights on
/// the training side, and fits with the supplied forest configuration.
pub fn train_classifier(
    training: &TrainingSet,
    config: &ForestConfig,
) -> Result<(TrainedClassifier, ClassificationReport)> {
    if training.is_empty() {
        return Err(PitchError::EmptyTrainingSet(
            "classifier: no engineered rows".to_string(),
        ));
    }
    let features = training.feature_matrix();
    let n_classes = training.label_encoding.len();

    let (train_idx, test_idx) = stratified_split(&training.labels, 0.2, config.seed);
    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| features[i].clone()).collect();
    let train_labels: Vec<u32> = train_idx.iter().map(|&i| training.labels[i]).collect();
    let weights = balanced_weights(&train_labels, n_classes);

    let forest = fit_classifier(&train_rows, &train_labels, n_classes, &weights, config);

    let mut truth = Vec::with_capacity(test_idx.len());
    let mut predicted = Vec::with_capacity(test_idx.len());
    let mut probabilities = Vec::with_capacity(test_idx.len());
    for &index in &test_idx {
        truth.push(training.labels[index]);
        predicted.push(forest.predict(&features[index]) as u32);
        probabilities.push(forest.predict_proba(&features[index]));
    }

    let labels = training.label_encoding.labels().to_vec();
    let report = ClassificationReport::from_predictions(
        &truth,
        &predicted,
        &probabilities,
        &labels,
        train_idx.len(),
    );
    log::info!(
        "classifier trained: {} classes, accuracy {:.4}, top-3 {:.4}",
        n_classes,
        report.accuracy,
        report.top3_accuracy
    );

    Ok((TrainedClassifier { forest, labels }, report))
}
