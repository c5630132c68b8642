//! CART fitting for the forest ensembles
//!
//! Trees grow independently on bootstrap samples. Each tree's RNG seeds
//! from the base seed plus the tree index and rayon collects results in
//! index order, so a fit is reproducible no matter how many workers run.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, ForestClassifier, ForestRegressor, TreeNode, LEAF};

/// Ensemble shape and sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// Fit a classification forest.
///
/// `labels` are encoded class codes below `n_classes`; `sample_weights`
/// scale both the split criterion and the leaf distributions (used for
/// inverse-frequency class balancing). Each split considers a random
/// sqrt-sized feature subset.
pub fn fit_classifier(
    rows: &[Vec<f64>],
    labels: &[u32],
    n_classes: usize,
    sample_weights: &[f64],
    config: &ForestConfig,
) -> ForestClassifier {
    let n_features = rows.first().map(Vec::len).unwrap_or(0);
    if rows.is_empty() || n_classes == 0 {
        return ForestClassifier {
            trees: Vec::new(),
            n_features,
            n_classes,
        };
    }

    let max_features = ((n_features as f64).sqrt() as usize).max(1);
    let grower = ClassifierGrower {
        rows,
        labels,
        weights: sample_weights,
        n_classes,
        max_features,
        config: *config,
    };

    let trees: Vec<DecisionTree> = (0..config.n_trees)
        .into_par_iter()
        .map(|tree_index| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(tree_index as u64));
            grower.grow_tree(&mut rng)
        })
        .collect();

    ForestClassifier {
        trees,
        n_features,
        n_classes,
    }
}

/// Fit a regression forest over fixed-width targets. Every split considers
/// every feature, matching the classifier only in ensemble mechanics.
pub fn fit_regressor(
    rows: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &ForestConfig,
) -> ForestRegressor {
    let n_features = rows.first().map(Vec::len).unwrap_or(0);
    let n_outputs = targets.first().map(Vec::len).unwrap_or(0);
    if rows.is_empty() || n_outputs == 0 {
        return ForestRegressor {
            trees: Vec::new(),
            n_features,
            n_outputs,
        };
    }

    let grower = RegressorGrower {
        rows,
        targets,
        n_outputs,
        config: *config,
    };

    let trees: Vec<DecisionTree> = (0..config.n_trees)
        .into_par_iter()
        .map(|tree_index| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(tree_index as u64));
            grower.grow_tree(&mut rng)
        })
        .collect();

    ForestRegressor {
        trees,
        n_features,
        n_outputs,
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn bootstrap_indices(n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Partial Fisher-Yates draw of `k` distinct feature indices, returned
/// sorted so the split search walks them in a stable order.
fn sample_features(n_features: usize, k: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let k = k.min(n_features);
    let mut indices: Vec<usize> = (0..n_features).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n_features);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

fn partition(
    rows: &[Vec<f64>],
    samples: &[usize],
    feature: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &index in samples {
        let value = rows[index][feature];
        if value.is_nan() || value <= threshold {
            left.push(index);
        } else {
            right.push(index);
        }
    }
    (left, right)
}

struct ClassifierGrower<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [u32],
    weights: &'a [f64],
    n_classes: usize,
    max_features: usize,
    config: ForestConfig,
}

impl ClassifierGrower<'_> {
    fn grow_tree(&self, rng: &mut ChaCha8Rng) -> DecisionTree {
        let samples = bootstrap_indices(self.rows.len(), rng);
        let mut nodes = Vec::new();
        self.grow(&samples, 0, rng, &mut nodes);
        DecisionTree { nodes }
    }

    fn grow(
        &self,
        samples: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        if depth >= self.config.max_depth
            || samples.len() < self.config.min_samples_split
            || self.is_pure(samples)
        {
            return self.push_leaf(samples, nodes);
        }

        let features = sample_features(self.rows[0].len(), self.max_features, rng);
        let split = features
            .iter()
            .filter_map(|&feature| self.best_threshold(samples, feature))
            .fold(None::<Split>, |best, candidate| match best {
                Some(current) if current.impurity <= candidate.impurity => Some(current),
                _ => Some(candidate),
            });

        let split = match split {
            Some(split) => split,
            None => return self.push_leaf(samples, nodes),
        };

        let (left_samples, right_samples) =
            partition(self.rows, samples, split.feature, split.threshold);
        if left_samples.is_empty() || right_samples.is_empty() {
            return self.push_leaf(samples, nodes);
        }

        let index = nodes.len();
        nodes.push(TreeNode {
            feature: split.feature as i32,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });
        let left = self.grow(&left_samples, depth + 1, rng, nodes);
        let right = self.grow(&right_samples, depth + 1, rng, nodes);
        nodes[index].left = left as i32;
        nodes[index].right = right as i32;
        index
    }

    fn is_pure(&self, samples: &[usize]) -> bool {
        let mut first = None;
        for &index in samples {
            match first {
                None => first = Some(self.labels[index]),
                Some(label) if label != self.labels[index] => return false,
                Some(_) => {}
            }
        }
        true
    }

    fn class_weights(&self, samples: &[usize]) -> (Vec<f64>, f64) {
        let mut weights = vec![0.0; self.n_classes];
        let mut total = 0.0;
        for &index in samples {
            let weight = self.weights[index];
            weights[self.labels[index] as usize] += weight;
            total += weight;
        }
        (weights, total)
    }

    fn push_leaf(&self, samples: &[usize], nodes: &mut Vec<TreeNode>) -> usize {
        let (mut distribution, total) = self.class_weights(samples);
        if total > 0.0 {
            distribution.iter_mut().for_each(|w| *w /= total);
        } else if self.n_classes > 0 {
            let uniform = 1.0 / self.n_classes as f64;
            distribution.iter_mut().for_each(|w| *w = uniform);
        }
        nodes.push(TreeNode {
            feature: LEAF,
            threshold: 0.0,
            left: LEAF,
            right: LEAF,
            value: Some(distribution),
        });
        nodes.len() - 1
    }

    /// Best midpoint threshold on one feature by weighted Gini, scanning
    /// boundaries between consecutive distinct sorted values.
    fn best_threshold(&self, samples: &[usize], feature: usize) -> Option<Split> {
        let mut points: Vec<(f64, u32, f64)> = samples
            .iter()
            .map(|&index| {
                (
                    self.rows[index][feature],
                    self.labels[index],
                    self.weights[index],
                )
            })
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (mut right, total) = {
            let mut weights = vec![0.0; self.n_classes];
            let mut total = 0.0;
            for (_, label, weight) in &points {
                weights[*label as usize] += weight;
                total += weight;
            }
            (weights, total)
        };
        if total <= 0.0 {
            return None;
        }

        let mut left = vec![0.0; self.n_classes];
        let mut left_total = 0.0;
        let mut best: Option<Split> = None;

        for i in 0..points.len().saturating_sub(1) {
            let (value, label, weight) = points[i];
            left[label as usize] += weight;
            left_total += weight;
            right[label as usize] -= weight;

            let next_value = points[i + 1].0;
            if value == next_value {
                continue;
            }

            let right_total = total - left_total;
            let impurity = (left_total / total) * gini(&left, left_total)
                + (right_total / total) * gini(&right, right_total);
            let threshold = (value + next_value) / 2.0;

            let better = match &best {
                Some(current) => impurity < current.impurity,
                None => true,
            };
            if better {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}

fn gini(class_weights: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - class_weights
        .iter()
        .map(|weight| (weight / total).powi(2))
        .sum::<f64>()
}

struct RegressorGrower<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [Vec<f64>],
    n_outputs: usize,
    config: ForestConfig,
}

impl RegressorGrower<'_> {
    fn grow_tree(&self, rng: &mut ChaCha8Rng) -> DecisionTree {
        let samples = bootstrap_indices(self.rows.len(), rng);
        let mut nodes = Vec::new();
        self.grow(&samples, 0, rng, &mut nodes);
        DecisionTree { nodes }
    }

    fn grow(
        &self,
        samples: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        if depth >= self.config.max_depth
            || samples.len() < self.config.min_samples_split
            || self.sum_squared_error(samples) < 1e-12
        {
            return self.push_leaf(samples, nodes);
        }

        let n_features = self.rows[0].len();
        let split = (0..n_features)
            .filter_map(|feature| self.best_threshold(samples, feature))
            .fold(None::<Split>, |best, candidate| match best {
                Some(current) if current.impurity <= candidate.impurity => Some(current),
                _ => Some(candidate),
            });

        let split = match split {
            Some(split) => split,
            None => return self.push_leaf(samples, nodes),
        };

        let (left_samples, right_samples) =
            partition(self.rows, samples, split.feature, split.threshold);
        if left_samples.is_empty() || right_samples.is_empty() {
            return self.push_leaf(samples, nodes);
        }

        let index = nodes.len();
        nodes.push(TreeNode {
            feature: split.feature as i32,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });
        let left = self.grow(&left_samples, depth + 1, rng, nodes);
        let right = self.grow(&right_samples, depth + 1, rng, nodes);
        nodes[index].left = left as i32;
        nodes[index].right = right as i32;
        index
    }

    fn mean_targets(&self, samples: &[usize]) -> Vec<f64> {
        let mut means = vec![0.0; self.n_outputs];
        if samples.is_empty() {
            return means;
        }
        for &index in samples {
            for (slot, value) in means.iter_mut().zip(&self.targets[index]) {
                *slot += value;
            }
        }
        let scale = 1.0 / samples.len() as f64;
        means.iter_mut().for_each(|slot| *slot *= scale);
        means
    }

    fn sum_squared_error(&self, samples: &[usize]) -> f64 {
        let means = self.mean_targets(samples);
        let mut sse = 0.0;
        for &index in samples {
            for (mean, value) in means.iter().zip(&self.targets[index]) {
                let diff = value - mean;
                sse += diff * diff;
            }
        }
        sse
    }

    fn push_leaf(&self, samples: &[usize], nodes: &mut Vec<TreeNode>) -> usize {
        nodes.push(TreeNode {
            feature: LEAF,
            threshold: 0.0,
            left: LEAF,
            right: LEAF,
            value: Some(self.mean_targets(samples)),
        });
        nodes.len() - 1
    }

    /// Best midpoint threshold on one feature by total squared error,
    /// using running sums so the scan stays linear after the sort.
    fn best_threshold(&self, samples: &[usize], feature: usize) -> Option<Split> {
        let mut order: Vec<usize> = samples.to_vec();
        order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

        let n = order.len();
        let mut total_sum = vec![0.0; self.n_outputs];
        let mut total_sq = vec![0.0; self.n_outputs];
        for &index in &order {
            for output in 0..self.n_outputs {
                let value = self.targets[index][output];
                total_sum[output] += value;
                total_sq[output] += value * value;
            }
        }

        let mut left_sum = vec![0.0; self.n_outputs];
        let mut left_sq = vec![0.0; self.n_outputs];
        let mut best: Option<Split> = None;

        for i in 0..n.saturating_sub(1) {
            let index = order[i];
            for output in 0..self.n_outputs {
                let value = self.targets[index][output];
                left_sum[output] += value;
                left_sq[output] += value * value;
            }

            let value = self.rows[index][feature];
            let next_value = self.rows[order[i + 1]][feature];
            if value == next_value {
                continue;
            }

            let left_count = (i + 1) as f64;
            let right_count = (n - i - 1) as f64;
            let mut impurity = 0.0;
            for output in 0..self.n_outputs {
                let left_mean_sq = left_sum[output] * left_sum[output] / left_count;
                let right_sum = total_sum[output] - left_sum[output];
                let right_mean_sq = right_sum * right_sum / right_count;
                let right_sq = total_sq[output] - left_sq[output];
                impurity += (left_sq[output] - left_mean_sq) + (right_sq - right_mean_sq);
            }

            let threshold = (value + next_value) / 2.0;
            let better = match &best {
                Some(current) => impurity < current.impurity,
                None => true,
            };
            if better {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}
