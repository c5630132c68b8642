//! # pitch_core - Run-Expectancy Driven Pitch Recommendation Engine
//!
//! This library turns raw pitch-by-pitch game logs into live pitch calls:
//! which pitch to throw next, where to throw it, and which historical
//! pitches back the call up.
//!
//! ## Features
//! - RE288 run-expectancy table built straight from game logs
//! - Reward engineering with an optional behavioral-cloning filter
//! - 100% deterministic training (same corpus + same seed = same artifact bytes)
//! - Compressed, checksummed model artifacts with atomic writes
//! - Ranked recommendations with target locations and historical precedents

pub mod artifact;
pub mod error;
pub mod features;
pub mod forest;
pub mod models;
pub mod precedent;
pub mod recommend;
pub mod run_expectancy;
pub mod train;

// Re-export the live recommendation surface
pub use precedent::find_similar;
pub use recommend::{pad_features, Recommender};

// Re-export core data types
pub use error::{PitchError, Result};
pub use models::{
    pitch_type_name, GameStateKey, PrecedentMatch, RawPitchRecord, Recommendation,
    RewardedPitchEvent, Situation,
};

// Re-export the training pipeline
pub use features::{EngineerOptions, FeatureEngineer, RewardLadder, TrainingSet};
pub use forest::ForestConfig;
pub use run_expectancy::{RETable, DEFAULT_RUN_EXPECTANCY};
pub use train::{
    train_classifier, train_location, ClassificationReport, RegressionReport, TrainedClassifier,
    TrainedLocationModel,
};

// Re-export artifact persistence
pub use artifact::{
    load_classifier, load_location, save_classifier, save_location, ArtifactCache, ArtifactError,
    ArtifactMetadata, ClassifierArtifact, LocationArtifact,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Deterministic plate crossing per pitch type, with a small spread so
    /// the regressor has something to fit.
    fn plate_target(pitch_type: &str, idx: usize) -> (f64, f64) {
        let jitter = ((idx % 5) as f64 - 2.0) * 0.03;
        match pitch_type {
            "FF" => (0.3 + jitter, 3.1 + jitter),
            "SL" => (-0.5 + jitter, 1.9 + jitter),
            "CU" => (-0.6 + jitter, 1.5 + jitter),
            "CH" => (0.2 + jitter, 1.8 + jitter),
            _ => (0.5 + jitter, 2.3 + jitter),
        }
    }

    /// Six short games with a learnable pitch-selection rule: fastballs
    /// when behind in the count, sliders at two strikes, offspeed rotation
    /// otherwise. A run scores after the first at-bat of every half-inning
    /// so run-expectancy values are not all zero.
    fn synthetic_corpus() -> Vec<RawPitchRecord> {
        let mut rows = Vec::new();
        for game in 0..6i64 {
            let game_pk = 717_000 + game;
            let mut at_bat = 0i32;
            let mut away_runs = 0i32;
            let mut home_runs = 0i32;
            for inning in 1..=3u8 {
                for half in ["Top", "Bot"] {
                    for ab in 0..3i32 {
                        at_bat += 1;
                        let (bat, fld) = if half == "Top" {
                            (away_runs, home_runs)
                        } else {
                            (home_runs, away_runs)
                        };
                        for pitch in 1..=3i32 {
                            let idx = rows.len();
                            let balls = ((pitch - 1 + ab) % 4) as u8;
                            let strikes = (pitch as u8 + inning) % 3;
                            let pitch_type = if balls >= 2 {
                                "FF"
                            } else if strikes == 2 {
                                "SL"
                            } else {
                                ["CU", "CH", "SI"][idx % 3]
                            };
                            let (px, pz) = plate_target(pitch_type, idx);
                            let last_pitch = pitch == 3;
                            rows.push(RawPitchRecord {
                                game_pk,
                                at_bat_number: at_bat,
                                pitch_number: pitch,
                                pitch_type: (idx % 19 != 7).then(|| pitch_type.to_string()),
                                inning: Some(inning),
                                inning_topbot: Some(half.to_string()),
                                balls: Some(balls),
                                strikes: Some(strikes),
                                outs_when_up: Some((ab % 3) as u8),
                                on_1b: (idx % 4 == 1).then_some(660_123.0),
                                on_2b: (idx % 5 == 2).then_some(1.0),
                                on_3b: (idx % 7 == 3).then_some(1.0),
                                stand: Some(if idx % 3 == 0 { "L" } else { "R" }.to_string()),
                                p_throws: Some(if game % 2 == 0 { "R" } else { "L" }.to_string()),
                                home_score: Some(home_runs),
                                away_score: Some(away_runs),
                                bat_score: Some(bat),
                                fld_score: Some(fld),
                                description: Some(
                                    match pitch {
                                        1 => "called_strike",
                                        2 => "ball",
                                        _ => "hit_into_play",
                                    }
                                    .to_string(),
                                ),
                                events: last_pitch.then(|| {
                                    if at_bat % 2 == 0 { "field_out" } else { "single" }
                                        .to_string()
                                }),
                                delta_run_exp: (idx % 7 == 3).then_some(0.10),
                                delta_pitcher_run_exp: (idx % 7 == 0).then_some(0.04),
                                plate_x: (idx % 17 != 9).then_some(px),
                                plate_z: (idx % 17 != 9).then_some(pz),
                            });
                        }
                        if ab == 0 {
                            if half == "Top" {
                                away_runs += 1;
                            } else {
                                home_runs += 1;
                            }
                        }
                    }
                }
            }
        }
        rows
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 12,
            max_depth: 6,
            min_samples_split: 4,
            seed: 42,
        }
    }

    fn train_and_save(records: &[RawPitchRecord], dir: &Path, tag: &str) -> (PathBuf, PathBuf) {
        let table = RETable::build(records);
        let training = FeatureEngineer::new(&table)
            .engineer(records, EngineerOptions::default())
            .expect("engineer");
        let config = small_config();
        let (classifier, _) = train_classifier(&training, &config).expect("train classifier");
        let (location, _) = train_location(&training, &config).expect("train location");

        let classifier_path = dir.join(format!("{tag}_pitch_model.bin"));
        let location_path = dir.join(format!("{tag}_location_model.bin"));
        save_classifier(&classifier_path, &classifier, &training.feature_names())
            .expect("save classifier");
        save_location(&location_path, &location).expect("save location");
        (classifier_path, location_path)
    }

    #[test]
    fn test_corpus_to_recommendation_pipeline() {
        let corpus = synthetic_corpus();
        let table = RETable::build(&corpus);
        assert!(!table.is_empty(), "Corpus visits many base/count states");
        assert!(
            table
                .entries()
                .any(|(_, entry)| entry.expected_runs > 0.0),
            "A run scores mid-half-inning, so some states expect runs"
        );

        let dir = tempfile::tempdir().expect("tempdir");
        let (classifier_path, location_path) = train_and_save(&corpus, dir.path(), "live");

        let recommender = Recommender::new(
            Arc::new(ArtifactCache::new()),
            classifier_path,
            location_path,
        );
        let situation = Situation {
            inning: 2,
            balls: 3,
            strikes: 0,
            outs_when_up: 1,
            on_1b: 1,
            ..Default::default()
        };
        let recs = recommender.recommend(&situation, 3).expect("recommend");

        assert_eq!(recs.len(), 3);
        assert_eq!(recs.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        for pair in recs.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
        let known = ["CH", "CU", "FF", "SI", "SL"];
        for rec in &recs {
            assert!(known.contains(&rec.pitch_type.as_str()));
            assert!((0.0..=1.0).contains(&rec.probability));
            assert!(rec.target_location.0.is_finite() && rec.target_location.1.is_finite());
        }
        assert!(recs[0].probability > 0.0);
        // The corpus throws fastballs whenever the count reaches two
        // balls, so a 3-0 count is a fastball call.
        assert_eq!(recs[0].pitch_type, "FF");
    }

    #[test]
    fn test_retraining_reproduces_artifact_bytes() {
        let corpus = synthetic_corpus();
        let mut reversed = corpus.clone();
        reversed.reverse();

        let dir = tempfile::tempdir().expect("tempdir");
        let (first_c, first_l) = train_and_save(&corpus, dir.path(), "a");
        let (second_c, second_l) = train_and_save(&reversed, dir.path(), "b");

        assert_eq!(
            fs::read(&first_c).expect("read a"),
            fs::read(&second_c).expect("read b"),
            "Classifier bytes must not depend on corpus row order"
        );
        assert_eq!(
            fs::read(&first_l).expect("read a"),
            fs::read(&second_l).expect("read b"),
            "Location bytes must not depend on corpus row order"
        );
    }

    #[test]
    fn test_behavioral_cloning_shrinks_and_still_trains() {
        let corpus = synthetic_corpus();
        let table = RETable::build(&corpus);
        let engineer = FeatureEngineer::new(&table);

        let unfiltered = engineer
            .engineer(&corpus, EngineerOptions::default())
            .expect("unfiltered");
        let filtered = engineer
            .engineer(
                &corpus,
                EngineerOptions {
                    behavioral_cloning: true,
                },
            )
            .expect("filtered");

        let report = filtered.filter_report.as_ref().expect("filter ran");
        assert_eq!(report.input_rows, unfiltered.len());
        assert!(filtered.len() < unfiltered.len());
        assert!(!filtered.is_empty());
        assert_eq!(filtered.labels.len(), filtered.len());

        let (classifier, _) =
            train_classifier(&filtered, &small_config()).expect("train on filtered set");
        assert_eq!(classifier.labels.len(), filtered.label_encoding.len());
    }

    #[test]
    fn test_reloaded_artifact_predicts_identically() {
        let corpus = synthetic_corpus();
        let dir = tempfile::tempdir().expect("tempdir");
        let (classifier_path, _) = train_and_save(&corpus, dir.path(), "reload");

        let first = load_classifier(&classifier_path).expect("first load");
        let second = load_classifier(&classifier_path).expect("second load");
        assert_eq!(first, second);

        let features = pad_features(&Situation::default(), &first.feature_names);
        assert_eq!(
            first.classifier.probabilities(&features),
            second.classifier.probabilities(&features)
        );
    }

    #[test]
    fn test_precedents_back_the_top_recommendation() {
        let corpus = synthetic_corpus();
        let dir = tempfile::tempdir().expect("tempdir");
        let (classifier_path, location_path) = train_and_save(&corpus, dir.path(), "prec");

        let recommender = Recommender::new(
            Arc::new(ArtifactCache::new()),
            classifier_path,
            location_path,
        );
        let situation = Situation {
            balls: 2,
            strikes: 2,
            outs_when_up: 1,
            inning: 3,
            ..Default::default()
        };
        let recs = recommender.recommend(&situation, 2).expect("recommend");

        // One history row per class at the right count; other fields are
        // unrecorded and so cannot disqualify.
        let history: Vec<PrecedentMatch> = ["CH", "CU", "FF", "SI", "SL"]
            .iter()
            .enumerate()
            .map(|(i, code)| PrecedentMatch {
                pitch_type: code.to_string(),
                balls: Some(situation.balls),
                strikes: Some(situation.strikes),
                detection_rate: Some(0.5 + i as f64 * 0.1),
                ..Default::default()
            })
            .collect();

        let precedents = find_similar(&history, &situation, &recs[0].pitch_type, 3);
        assert_eq!(precedents.len(), 1);
        assert_eq!(precedents[0].pitch_type, recs[0].pitch_type);
    }
}
