//! Conditioned location regressor training
//!
//! Predicts the plate crossing point (x, z) from the situational features
//! plus a pitch-type code. Training uses the true thrown type; inference
//! substitutes each candidate type, which is what makes the output
//! type-conditional.

use serde::{Deserialize, Serialize};

use crate::error::{PitchError, Result};
use crate::features::TrainingSet;
use crate::forest::{fit_regressor, ForestConfig, ForestRegressor};

use super::metrics::{rmse, RegressionReport};
use super::split::shuffled_split;

/// A frozen location regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLocationModel {
    pub forest: ForestRegressor,
}

impl TrainedLocationModel {
    /// Predict (x, z) for features already carrying the candidate type
    /// code as their final column.
    pub fn predict(&self, features: &[f64]) -> (f64, f64) {
        let output = self.forest.predict(features);
        (
            output.first().copied().unwrap_or(0.0),
            output.get(1).copied().unwrap_or(0.0),
        )
    }
}

/// Train the location model on the subset of rows with a recorded plate
/// crossing. Splits are unstratified; the regressor splits nodes down to
/// pairs regardless of the classifier's minimum.
pub fn train_location(
    training: &TrainingSet,
    config: &ForestConfig,
) -> Result<(TrainedLocationModel, RegressionReport)> {
    let (rows, targets) = training.location_matrix();
    if rows.is_empty() {
        return Err(PitchError::EmptyTrainingSet(
            "location: no rows with a recorded plate crossing".to_string(),
        ));
    }

    let config = ForestConfig {
        min_samples_split: 2,
        ..*config
    };
    let (train_idx, test_idx) = shuffled_split(rows.len(), 0.2, config.seed);
    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let train_targets: Vec<Vec<f64>> = train_idx.iter().map(|&i| targets[i].clone()).collect();

    let forest = fit_regressor(&train_rows, &train_targets, &config);

    let truth: Vec<Vec<f64>> = test_idx.iter().map(|&i| targets[i].clone()).collect();
    let predicted: Vec<Vec<f64>> = test_idx.iter().map(|&i| forest.predict(&rows[i])).collect();
    let report = RegressionReport {
        rmse: rmse(&truth, &predicted).unwrap_or(0.0),
        n_train: train_idx.len(),
        n_test: test_idx.len(),
    };
    log::info!("location model trained: {}", report);

    Ok((TrainedLocationModel { forest }, report))
}
