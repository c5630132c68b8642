//! Model Builder Library
//!
//! Corpus CSV → RE288 table → engineered training set → forest artifacts.
//! The CLI in `main.rs` is a thin wrapper over this; the functions here are
//! also what integration environments call directly.

pub mod corpus;

use anyhow::{Context, Result};
use pitch_core::artifact::{save_classifier, save_location, ArtifactMetadata};
use pitch_core::features::{EngineerOptions, FeatureEngineer, FilterReport};
use pitch_core::forest::ForestConfig;
use pitch_core::run_expectancy::RETable;
use pitch_core::train::{train_classifier, train_location, ClassificationReport, RegressionReport};
use std::fs;
use std::path::{Path, PathBuf};

// Re-export corpus ingest
pub use corpus::{parse_corpus_csv, parse_history_csv, ParseStats, TARGET_COLUMN};

/// Artifact file names inside a model directory
pub const CLASSIFIER_FILE: &str = "pitch_model.bin";
pub const CLASSIFIER_FILTERED_FILE: &str = "pitch_model_filtered.bin";
pub const LOCATION_FILE: &str = "location_model.bin";
pub const RE_TABLE_FILE: &str = "re288_table.csv";

/// Training options, mirrored by the CLI flags.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Keep only better-than-median pitches before fitting
    pub filter: bool,
    pub seed: u64,
    pub trees: usize,
    /// Load this run-expectancy table instead of rebuilding it from the
    /// corpus
    pub re_table: Option<PathBuf>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            filter: false,
            seed: 42,
            trees: 100,
            re_table: None,
        }
    }
}

/// Everything one training run produced.
#[derive(Debug)]
pub struct TrainOutcome {
    pub classifier_path: PathBuf,
    pub location_path: PathBuf,
    pub classifier_metadata: ArtifactMetadata,
    pub location_metadata: ArtifactMetadata,
    pub classification: ClassificationReport,
    pub regression: RegressionReport,
    pub parse_stats: ParseStats,
    pub engineered_rows: usize,
    pub filter_report: Option<FilterReport>,
}

/// Build the RE288 run-expectancy table from a corpus export and write it
/// as CSV.
///
/// Unlabeled pitches still count here; the table wants every pitch of
/// every half-inning, not just the ones training keeps.
pub fn build_re_table(corpus_csv: &Path, out_csv: &Path) -> Result<(RETable, ParseStats)> {
    let (records, stats) = parse_corpus_csv(corpus_csv)?;
    let table = RETable::build(&records);
    table.save_csv(out_csv)?;
    Ok((table, stats))
}

/// Train the classifier and location model from a corpus export and write
/// both artifacts into `out_dir`.
///
/// When no run-expectancy table is supplied one is built from the same
/// corpus and written next to the artifacts. A filtered run writes the
/// classifier under [`CLASSIFIER_FILTERED_FILE`] so both variants can live
/// in one directory.
pub fn train_models(
    corpus_csv: &Path,
    out_dir: &Path,
    options: &TrainOptions,
) -> Result<TrainOutcome> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let (records, parse_stats) = parse_corpus_csv(corpus_csv)?;

    let table = match &options.re_table {
        Some(path) => RETable::load_csv(path)?,
        None => {
            let table = RETable::build(&records);
            table.save_csv(&out_dir.join(RE_TABLE_FILE))?;
            table
        }
    };

    let training = FeatureEngineer::new(&table).engineer(
        &records,
        EngineerOptions {
            behavioral_cloning: options.filter,
        },
    )?;

    let config = ForestConfig {
        n_trees: options.trees,
        seed: options.seed,
        ..ForestConfig::default()
    };
    let (classifier, classification) = train_classifier(&training, &config)?;
    let (location, regression) = train_location(&training, &config)?;

    let classifier_name = if options.filter {
        CLASSIFIER_FILTERED_FILE
    } else {
        CLASSIFIER_FILE
    };
    let classifier_path = out_dir.join(classifier_name);
    let location_path = out_dir.join(LOCATION_FILE);
    let classifier_metadata =
        save_classifier(&classifier_path, &classifier, &training.feature_names())?;
    let location_metadata = save_location(&location_path, &location)?;

    Ok(TrainOutcome {
        classifier_path,
        location_path,
        classifier_metadata,
        location_metadata,
        classification,
        regression,
        parse_stats,
        engineered_rows: training.len(),
        filter_report: training.filter_report,
    })
}

/// Classifier artifact to serve from a model directory. A filtered model
/// wins over the unfiltered one when both exist.
pub fn resolve_classifier_path(model_dir: &Path) -> PathBuf {
    let filtered = model_dir.join(CLASSIFIER_FILTERED_FILE);
    if filtered.exists() {
        filtered
    } else {
        model_dir.join(CLASSIFIER_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::artifact::file_checksum;
    use std::fmt::Write as _;

    /// Writes a small but trainable corpus: three pitch types driven by
    /// the count, fixed plate targets per type, one run per half-inning.
    fn write_corpus(dir: &Path) -> PathBuf {
        let mut content = String::from(
            "game_pk,at_bat_number,pitch_number,pitch_type,inning,inning_topbot,balls,strikes,\
             outs_when_up,on_1b,on_2b,on_3b,stand,p_throws,home_score,away_score,bat_score,\
             fld_score,description,events,delta_run_exp,delta_pitcher_run_exp,plate_x,plate_z\n",
        );
        for game in 0..4i64 {
            let game_pk = 717_100 + game;
            for ab in 0..6i32 {
                let inning = 1 + ab / 3;
                let away = (ab / 2) as i32;
                for pitch in 1..=3i32 {
                    let balls = (pitch - 1 + ab) % 4;
                    let strikes = (pitch + ab) % 3;
                    let pitch_type = if balls >= 2 {
                        "FF"
                    } else if strikes == 2 {
                        "SL"
                    } else {
                        "CU"
                    };
                    let (px, pz) = match pitch_type {
                        "FF" => (0.3, 3.0),
                        "SL" => (-0.5, 1.9),
                        _ => (-0.6, 1.5),
                    };
                    let on_1b = if ab % 2 == 1 { "630105.0" } else { "" };
                    writeln!(
                        content,
                        "{game_pk},{ab},{pitch},{pitch_type},{inning},Top,{balls},{strikes},\
                         {outs},{on_1b},,,R,R,0,{away},{away},0,called_strike,,,,{px},{pz}",
                        outs = ab % 3,
                    )
                    .expect("format row");
                }
            }
        }
        let path = dir.join("corpus.csv");
        fs::write(&path, content).expect("write corpus");
        path
    }

    fn quick_options() -> TrainOptions {
        TrainOptions {
            trees: 10,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn test_build_re_table_writes_loadable_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = write_corpus(dir.path());
        let out = dir.path().join("re288_table.csv");

        let (table, stats) = build_re_table(&corpus, &out).expect("build");
        assert!(stats.parsed > 0);
        assert!(!table.is_empty());

        let reloaded = RETable::load_csv(&out).expect("reload");
        assert_eq!(reloaded.len(), table.len());
    }

    #[test]
    fn test_train_models_writes_verified_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = write_corpus(dir.path());
        let out_dir = dir.path().join("models");

        let outcome = train_models(&corpus, &out_dir, &quick_options()).expect("train");

        assert!(outcome.classifier_path.ends_with(CLASSIFIER_FILE));
        assert!(outcome.classifier_path.exists());
        assert!(outcome.location_path.exists());
        assert!(out_dir.join(RE_TABLE_FILE).exists());
        assert!(outcome.engineered_rows > 0);
        assert!(outcome.filter_report.is_none());
        assert!(outcome.classification.n_test > 0);

        // The metadata checksum is the checksum of the file on disk.
        assert_eq!(
            file_checksum(&outcome.classifier_path).expect("checksum"),
            outcome.classifier_metadata.checksum
        );
        assert_eq!(
            file_checksum(&outcome.location_path).expect("checksum"),
            outcome.location_metadata.checksum
        );
    }

    #[test]
    fn test_filtered_run_uses_filtered_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = write_corpus(dir.path());
        let out_dir = dir.path().join("models");

        let outcome = train_models(
            &corpus,
            &out_dir,
            &TrainOptions {
                filter: true,
                ..quick_options()
            },
        )
        .expect("train filtered");

        assert!(outcome.classifier_path.ends_with(CLASSIFIER_FILTERED_FILE));
        let report = outcome.filter_report.expect("filter ran");
        assert!(report.retained_rows < report.input_rows);
    }

    #[test]
    fn test_supplied_re_table_is_not_rebuilt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = write_corpus(dir.path());
        let table_path = dir.path().join("prebuilt.csv");
        build_re_table(&corpus, &table_path).expect("prebuild");

        let out_dir = dir.path().join("models");
        let outcome = train_models(
            &corpus,
            &out_dir,
            &TrainOptions {
                re_table: Some(table_path),
                ..quick_options()
            },
        )
        .expect("train");

        assert!(outcome.classifier_path.exists());
        assert!(
            !out_dir.join(RE_TABLE_FILE).exists(),
            "A supplied table must not be rebuilt into the output directory"
        );
    }

    #[test]
    fn test_resolve_classifier_path_prefers_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(resolve_classifier_path(dir.path()).ends_with(CLASSIFIER_FILE));

        fs::write(dir.path().join(CLASSIFIER_FILTERED_FILE), b"x").expect("touch");
        assert!(resolve_classifier_path(dir.path()).ends_with(CLASSIFIER_FILTERED_FILE));
    }

    #[test]
    fn test_trained_artifacts_serve_recommendations() {
        use pitch_core::{ArtifactCache, Recommender, Situation};
        use std::sync::Arc;

        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = write_corpus(dir.path());
        let out_dir = dir.path().join("models");
        train_models(&corpus, &out_dir, &quick_options()).expect("train");

        let recommender = Recommender::new(
            Arc::new(ArtifactCache::new()),
            resolve_classifier_path(&out_dir),
            out_dir.join(LOCATION_FILE),
        );
        let situation = Situation {
            balls: 3,
            strikes: 1,
            ..Default::default()
        };
        let recs = recommender.recommend(&situation, 3).expect("recommend");
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].pitch_type, "FF", "Two-plus balls is a fastball count in this corpus");
    }
}
