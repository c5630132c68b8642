//! Flat-array decision trees and their ensembles
//!
//! Nodes live in a single `Vec`; `feature == -1` marks a leaf whose `value`
//! holds the payload (a class distribution for classification, per-output
//! means for regression). Traversal sends NaN features left, so a missing
//! value degrades to a prediction instead of a panic.

use serde::{Deserialize, Serialize};

/// Marker for leaf nodes in the `feature` field.
pub const LEAF: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index tested at this node, or [`LEAF`]
    pub feature: i32,
    pub threshold: f64,
    /// Left child index, taken when `feature_value <= threshold` or NaN
    pub left: i32,
    /// Right child index
    pub right: i32,
    /// Leaf payload; `None` on internal nodes
    pub value: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf payload. Returns `None` on an empty or
    /// malformed tree instead of panicking.
    pub fn predict(&self, features: &[f64]) -> Option<&[f64]> {
        let mut index = 0usize;
        let mut hops = 0usize;
        while let Some(node) = self.nodes.get(index) {
            if node.feature == LEAF {
                return node.value.as_deref();
            }
            let value = features
                .get(node.feature as usize)
                .copied()
                .unwrap_or(f64::NAN);
            let next = if value.is_nan() || value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return None;
            }
            index = next as usize;
            // Guard against reference cycles in deserialized trees.
            hops += 1;
            if hops > self.nodes.len() {
                return None;
            }
        }
        None
    }

    /// Structural check used when loading deserialized artifacts: child
    /// indices in range, leaves carrying payloads of the expected width.
    pub fn validate(&self, payload_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let count = self.nodes.len() as i32;
        for (index, node) in self.nodes.iter().enumerate() {
            if node.feature == LEAF {
                match &node.value {
                    Some(value) if value.len() == payload_width => {}
                    Some(value) => {
                        return Err(format!(
                            "leaf {} payload width {} (expected {})",
                            index,
                            value.len(),
                            payload_width
                        ));
                    }
                    None => return Err(format!("leaf {} has no payload", index)),
                }
            } else {
                if node.feature < 0 {
                    return Err(format!("node {} has negative feature index", index));
                }
                if node.left < 0 || node.left >= count || node.right < 0 || node.right >= count {
                    return Err(format!("node {} child index out of range", index));
                }
            }
        }
        Ok(())
    }
}

/// Averaged ensemble of classification trees. Leaf payloads are class
/// probability vectors of length `n_classes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub trees: Vec<DecisionTree>,
    pub n_features: usize,
    pub n_classes: usize,
}

impl ForestClassifier {
    /// Mean of per-tree class distributions. Falls back to uniform when no
    /// tree resolves (empty ensemble).
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_classes];
        let mut resolved = 0usize;
        for tree in &self.trees {
            if let Some(leaf) = tree.predict(features) {
                for (slot, value) in acc.iter_mut().zip(leaf) {
                    *slot += value;
                }
                resolved += 1;
            }
        }
        if resolved == 0 {
            if self.n_classes > 0 {
                let uniform = 1.0 / self.n_classes as f64;
                acc.iter_mut().for_each(|slot| *slot = uniform);
            }
            return acc;
        }
        let scale = 1.0 / resolved as f64;
        acc.iter_mut().for_each(|slot| *slot *= scale);
        acc
    }

    /// Most probable class index, ties resolved toward the lower index.
    pub fn predict(&self, features: &[f64]) -> usize {
        let probabilities = self.predict_proba(features);
        let mut best = 0usize;
        let mut best_probability = f64::NEG_INFINITY;
        for (index, probability) in probabilities.iter().enumerate() {
            if *probability > best_probability {
                best = index;
                best_probability = *probability;
            }
        }
        best
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_classes == 0 {
            return Err("classifier has zero classes".to_string());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_classes)
                .map_err(|e| format!("tree {}: {}", index, e))?;
        }
        Ok(())
    }
}

/// Averaged ensemble of regression trees with fixed-width output leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub trees: Vec<DecisionTree>,
    pub n_features: usize,
    pub n_outputs: usize,
}

impl ForestRegressor {
    /// Mean of per-tree outputs; zeros when no tree resolves.
    pub fn predict(&self, features: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_outputs];
        let mut resolved = 0usize;
        for tree in &self.trees {
            if let Some(leaf) = tree.predict(features) {
                for (slot, value) in acc.iter_mut().zip(leaf) {
                    *slot += value;
                }
                resolved += 1;
            }
        }
        if resolved > 0 {
            let scale = 1.0 / resolved as f64;
            acc.iter_mut().for_each(|slot| *slot *= scale);
        }
        acc
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_outputs == 0 {
            return Err("regressor has zero outputs".to_string());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_outputs)
                .map_err(|e| format!("tree {}: {}", index, e))?;
        }
        Ok(())
    }
}
