//! Pitch recommendation from stored artifacts
//!
//! The recommender answers the live question: given the current game
//! situation, which pitch types is this staff most likely to throw, and
//! where. It scores the situation with the stored classifier, ranks the
//! class probabilities, and asks the location regressor for a target per
//! candidate. Feature vectors are rebuilt against the artifact's own
//! feature-name list, so a caller compiled against a different column
//! order still feeds the model what it was fit on.

use std::path::PathBuf;
use std::sync::Arc;

use crate::artifact::ArtifactCache;
use crate::error::{PitchError, Result};
use crate::models::{GameStateKey, Recommendation, Situation};
use crate::train::top_k_indices;

/// Builds the model input for `situation` in the column order the stored
/// artifact declares. Names the situation does not produce are filled
/// with 0.0; situation fields the artifact does not ask for are dropped.
pub fn pad_features(situation: &Situation, feature_names: &[String]) -> Vec<f64> {
    let available = situation.feature_map();
    feature_names
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| *v)
                .unwrap_or(0.0)
        })
        .collect()
}

pub struct Recommender {
    cache: Arc<ArtifactCache>,
    classifier_path: PathBuf,
    location_path: PathBuf,
}

impl Recommender {
    pub fn new(
        cache: Arc<ArtifactCache>,
        classifier_path: PathBuf,
        location_path: PathBuf,
    ) -> Self {
        Self {
            cache,
            classifier_path,
            location_path,
        }
    }

    /// Top `top_k` pitch candidates for `situation`, ranked by classifier
    /// probability, each with a target location from the regressor.
    ///
    /// Probabilities are reported as the classifier emitted them, not
    /// renormalized over the returned subset.
    pub fn recommend(&self, situation: &Situation, top_k: usize) -> Result<Vec<Recommendation>> {
        let classifier = self.cache.classifier(&self.classifier_path)?;
        if classifier.feature_names.is_empty() {
            return Err(PitchError::IncompatibleSchema(
                "stored classifier carries no feature-name list".to_string(),
            ));
        }

        let features = pad_features(situation, &classifier.feature_names);
        let probabilities = classifier.classifier.probabilities(&features);
        let ranked = top_k_indices(&probabilities, top_k);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let location = self.cache.location(&self.location_path)?;
        let mut recommendations = Vec::with_capacity(ranked.len());
        for (rank, &class_idx) in ranked.iter().enumerate() {
            // The regressor was fit on the classifier schema plus the
            // candidate's own type code as the trailing column.
            let mut located = pad_features(situation, &classifier.feature_names);
            located.push(class_idx as f64);
            let target_location = location.model.predict(&located);

            recommendations.push(Recommendation {
                rank: rank + 1,
                pitch_type: classifier
                    .classifier
                    .labels
                    .get(class_idx)
                    .cloned()
                    .unwrap_or_else(|| class_idx.to_string()),
                probability: probabilities.get(class_idx).copied().unwrap_or(0.0),
                target_location,
            });
        }
        log::debug!(
            "recommended {} of {} classes for {}",
            recommendations.len(),
            classifier.classifier.n_classes(),
            GameStateKey::from_situation(situation)
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{save_classifier, save_location};
    use crate::features::FEATURE_COLUMNS;
    use crate::forest::{DecisionTree, ForestClassifier, ForestRegressor, TreeNode, LEAF};
    use crate::train::{TrainedClassifier, TrainedLocationModel};
    use std::path::Path;

    fn leaf(value: Vec<f64>) -> TreeNode {
        TreeNode {
            feature: LEAF,
            threshold: 0.0,
            left: LEAF,
            right: LEAF,
            value: Some(value),
        }
    }

    fn canonical_names() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    /// Seven-class classifier that always emits the same distribution.
    fn fixed_classifier(probs: Vec<f64>, labels: &[&str]) -> TrainedClassifier {
        TrainedClassifier {
            forest: ForestClassifier {
                trees: vec![DecisionTree {
                    nodes: vec![leaf(probs)],
                }],
                n_features: FEATURE_COLUMNS.len(),
                n_classes: labels.len(),
            },
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Location model with a single split on the trailing pitch-code
    /// column: codes <= 4 aim low-left, the rest high-right.
    fn code_split_location() -> TrainedLocationModel {
        let n_features = FEATURE_COLUMNS.len() + 1;
        TrainedLocationModel {
            forest: ForestRegressor {
                trees: vec![DecisionTree {
                    nodes: vec![
                        TreeNode {
                            feature: FEATURE_COLUMNS.len() as i32,
                            threshold: 4.5,
                            left: 1,
                            right: 2,
                            value: None,
                        },
                        leaf(vec![-0.5, 1.5]),
                        leaf(vec![0.5, 3.0]),
                    ],
                }],
                n_features,
                n_outputs: 2,
            },
        }
    }

    fn write_artifacts(dir: &Path, classifier: &TrainedClassifier, names: &[String]) {
        save_classifier(&dir.join("pitch_model.bin"), classifier, names).expect("save classifier");
        save_location(&dir.join("location_model.bin"), &code_split_location())
            .expect("save location");
    }

    fn recommender(dir: &Path) -> Recommender {
        Recommender::new(
            Arc::new(ArtifactCache::new()),
            dir.join("pitch_model.bin"),
            dir.join("location_model.bin"),
        )
    }

    #[test]
    fn test_pad_features_reorders_to_artifact_schema() {
        let situation = Situation {
            balls: 3,
            strikes: 1,
            outs_when_up: 2,
            ..Default::default()
        };
        let names = vec![
            "strikes".to_string(),
            "balls".to_string(),
            "outs_when_up".to_string(),
        ];
        assert_eq!(pad_features(&situation, &names), vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_pad_features_fills_unknown_names_with_zero() {
        let situation = Situation {
            balls: 2,
            ..Default::default()
        };
        let names = vec!["balls".to_string(), "release_spin_rate".to_string()];
        assert_eq!(pad_features(&situation, &names), vec![2.0, 0.0]);
    }

    #[test]
    fn test_pad_features_drops_fields_the_artifact_never_asks_for() {
        let situation = Situation {
            inning: 9,
            score_diff: -2,
            ..Default::default()
        };
        let names = vec!["score_diff".to_string()];
        assert_eq!(pad_features(&situation, &names), vec![-2.0]);
    }

    #[test]
    fn test_recommend_ranks_by_probability_with_stable_ties() {
        let dir = tempfile::tempdir().expect("tempdir");
        let labels = ["CH", "CU", "FC", "FF", "SI", "SL", "ST"];
        let probs = vec![0.05, 0.1, 0.3, 0.05, 0.2, 0.2, 0.1];
        write_artifacts(
            dir.path(),
            &fixed_classifier(probs, &labels),
            &canonical_names(),
        );

        // 0-2 count, nobody on, no previous pitch on record.
        let situation = Situation {
            strikes: 2,
            ..Default::default()
        };
        let recs = recommender(dir.path())
            .recommend(&situation, 3)
            .expect("recommend");

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].pitch_type, "FC");
        assert!((recs[0].probability - 0.3).abs() < 1e-12);
        // SI and SL share 0.2; the lower class index comes first.
        assert_eq!(recs[1].pitch_type, "SI");
        assert_eq!(recs[2].pitch_type, "SL");
        assert_eq!(
            recs.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        for pair in recs.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
    }

    #[test]
    fn test_recommend_targets_depend_on_candidate_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let labels = ["CH", "CU", "FC", "FF", "SI", "SL", "ST"];
        let probs = vec![0.05, 0.1, 0.3, 0.05, 0.2, 0.2, 0.1];
        write_artifacts(
            dir.path(),
            &fixed_classifier(probs, &labels),
            &canonical_names(),
        );

        let recs = recommender(dir.path())
            .recommend(&Situation::default(), 3)
            .expect("recommend");

        // FC (code 2) and SI (code 4) sit left of the split, SL (code 5)
        // right of it.
        assert_eq!(recs[0].target_location, (-0.5, 1.5));
        assert_eq!(recs[1].target_location, (-0.5, 1.5));
        assert_eq!(recs[2].target_location, (0.5, 3.0));
    }

    #[test]
    fn test_recommend_caps_at_class_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let labels = ["FF", "SL"];
        write_artifacts(
            dir.path(),
            &fixed_classifier(vec![0.7, 0.3], &labels),
            &canonical_names(),
        );

        let recs = recommender(dir.path())
            .recommend(&Situation::default(), 5)
            .expect("recommend");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].pitch_type, "FF");
    }

    #[test]
    fn test_missing_classifier_maps_to_model_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = recommender(dir.path())
            .recommend(&Situation::default(), 3)
            .expect_err("no artifacts");
        assert!(matches!(err, PitchError::ModelNotFound { .. }));
    }

    #[test]
    fn test_missing_location_model_maps_to_model_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let labels = ["FF", "SL"];
        save_classifier(
            &dir.path().join("pitch_model.bin"),
            &fixed_classifier(vec![0.7, 0.3], &labels),
            &canonical_names(),
        )
        .expect("save classifier");

        let err = recommender(dir.path())
            .recommend(&Situation::default(), 1)
            .expect_err("no location model");
        match err {
            PitchError::ModelNotFound { path } => assert!(path.contains("location_model")),
            other => panic!("expected ModelNotFound, got {other}"),
        }
    }

    #[test]
    fn test_empty_feature_names_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let labels = ["FF", "SL"];
        write_artifacts(dir.path(), &fixed_classifier(vec![0.7, 0.3], &labels), &[]);

        let err = recommender(dir.path())
            .recommend(&Situation::default(), 1)
            .expect_err("schema-less artifact");
        assert!(matches!(err, PitchError::IncompatibleSchema(_)));
    }
}
