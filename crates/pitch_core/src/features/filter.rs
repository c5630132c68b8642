//! Behavioral-cloning filter
//!
//! Keeps only the better-than-median half of the corpus, measured by
//! reward, so the classifier clones the pitches that worked instead of
//! everything that was thrown.

use serde::{Deserialize, Serialize};

/// Record of one filter application, kept for reproducibility reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub input_rows: usize,
    pub retained_rows: usize,
    pub threshold: f64,
}

/// Median with linear interpolation for even-length input. `None` on
/// empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Indices of rows whose reward is strictly greater than the median, in
/// their original order.
///
/// Strictness matters: with many tied rewards at the median the tied rows
/// all drop, which can retain well under half the input.
pub fn behavioral_cloning_indices(rewards: &[f64]) -> (Vec<usize>, FilterReport) {
    let threshold = median(rewards).unwrap_or(0.0);
    let keep: Vec<usize> = rewards
        .iter()
        .enumerate()
        .filter(|(_, reward)| **reward > threshold)
        .map(|(index, _)| index)
        .collect();

    let report = FilterReport {
        input_rows: rewards.len(),
        retained_rows: keep.len(),
        threshold,
    };
    log::info!(
        "behavioral cloning filter: {} -> {} rows (threshold {:.4})",
        report.input_rows,
        report.retained_rows,
        report.threshold
    );
    (keep, report)
}
