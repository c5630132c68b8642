//! Feature engineering
//!
//! Turns raw corpus rows into the model-ready training set: cleaning
//! defaults, chronological ordering, previous-pitch sequencing, label
//! encodings, per-pitch rewards, and the optional behavioral-cloning
//! filter.

use crate::error::{PitchError, Result};
use crate::models::{RawPitchRecord, RewardedPitchEvent, Situation};
use crate::run_expectancy::RETable;

use super::encoding::{LabelEncoding, NO_PITCH};
use super::filter::{behavioral_cloning_indices, FilterReport};
use super::reward::{RewardInput, RewardLadder};
use super::schema::{FEATURE_COLUMNS, PITCH_TYPE_CODE_COLUMN};

/// Engineering options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineerOptions {
    /// Keep only rows with better-than-median reward
    pub behavioral_cloning: bool,
}

/// A fully engineered corpus, ready for the trainers.
///
/// `labels` holds the encoded target of each event, aligned with `events`.
/// The target encoding is fit after any filtering, so its label set is
/// exactly what the classifier will see.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub events: Vec<RewardedPitchEvent>,
    pub labels: Vec<u32>,
    pub label_encoding: LabelEncoding,
    /// Previous-pitch encoding, sentinel included; fit before filtering
    /// and distinct from the target encoding
    pub prev_encoding: LabelEncoding,
    pub filter_report: Option<FilterReport>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Classifier feature matrix in [`FEATURE_COLUMNS`] order.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.events
            .iter()
            .map(|event| event.situation.feature_vector())
            .collect()
    }

    /// Stored schema of the classifier matrix.
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect()
    }

    /// Stored schema of the location matrix.
    pub fn location_feature_names(&self) -> Vec<String> {
        let mut names = self.feature_names();
        names.push(PITCH_TYPE_CODE_COLUMN.to_string());
        names
    }

    /// Location training rows: classifier features plus the true encoded
    /// pitch type, paired with the recorded (x, z) crossing point. Events
    /// without a recorded crossing point are skipped.
    pub fn location_matrix(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for (event, code) in self.events.iter().zip(&self.labels) {
            if let Some((x, z)) = event.location {
                let mut features = event.situation.feature_vector();
                features.push(f64::from(*code));
                rows.push(features);
                targets.push(vec![x, z]);
            }
        }
        (rows, targets)
    }
}

/// Builds [`TrainingSet`]s from raw corpus rows against a run-expectancy
/// table.
pub struct FeatureEngineer<'a> {
    re_table: &'a RETable,
    ladder: RewardLadder,
}

impl<'a> FeatureEngineer<'a> {
    pub fn new(re_table: &'a RETable) -> Self {
        Self {
            re_table,
            ladder: RewardLadder::standard(),
        }
    }

    pub fn with_ladder(re_table: &'a RETable, ladder: RewardLadder) -> Self {
        Self { re_table, ladder }
    }

    /// Engineer the full training set.
    ///
    /// Rows without a pitch-type label are dropped; everything else takes
    /// cleaning defaults (missing counts and flags become zero). Returns
    /// [`PitchError::EmptyTrainingSet`] when nothing labeled survives.
    pub fn engineer(
        &self,
        records: &[RawPitchRecord],
        options: EngineerOptions,
    ) -> Result<TrainingSet> {
        let mut rows: Vec<&RawPitchRecord> =
            records.iter().filter(|r| r.pitch_type.is_some()).collect();
        if rows.is_empty() {
            return Err(PitchError::EmptyTrainingSet(
                "no rows carry a pitch_type label".to_string(),
            ));
        }
        rows.sort_by_key(|r| r.sort_key());

        // Previous pitch within each (game, at-bat); the first pitch of an
        // at-bat gets the sentinel. Rows are grouped after the sort, so a
        // running (group, label) pair is enough.
        let mut prev_labels: Vec<&str> = Vec::with_capacity(rows.len());
        let mut last_in_group: Option<((i64, i32), &str)> = None;
        for row in &rows {
            let group = (row.game_pk, row.at_bat_number);
            let prev = match &last_in_group {
                Some((g, label)) if *g == group => *label,
                _ => NO_PITCH,
            };
            prev_labels.push(prev);
            if let Some(label) = row.pitch_type.as_deref() {
                last_in_group = Some((group, label));
            }
        }

        let prev_encoding = LabelEncoding::fit(prev_labels.iter().copied());

        let mut events = Vec::with_capacity(rows.len());
        for (row, prev_label) in rows.iter().zip(&prev_labels) {
            // encode() cannot miss here: prev_encoding was fit over these
            // exact labels.
            let prev_code = prev_encoding.encode(prev_label).unwrap_or(0);
            let situation = Situation {
                inning: row.inning.unwrap_or(0),
                balls: row.balls.unwrap_or(0),
                strikes: row.strikes.unwrap_or(0),
                outs_when_up: row.outs_when_up.unwrap_or(0),
                score_diff: match (row.fld_score, row.bat_score) {
                    (Some(fld), Some(bat)) => fld - bat,
                    _ => 0,
                },
                on_1b: RawPitchRecord::runner_flag(row.on_1b),
                on_2b: RawPitchRecord::runner_flag(row.on_2b),
                on_3b: RawPitchRecord::runner_flag(row.on_3b),
                is_batter_lefty: u8::from(row.stand.as_deref() == Some("L")),
                pitcher_throws_left: u8::from(row.p_throws.as_deref() == Some("L")),
                prev_pitch_type_code: prev_code,
            };

            let reward_input = RewardInput {
                pitcher_run_delta: row.delta_pitcher_run_exp,
                batter_run_delta: row.delta_run_exp,
                description: row.description.as_deref(),
                events: row.events.as_deref(),
                pre_pitch_expectancy: self.re_table.lookup(&row.game_state_key()),
            };
            let reward = self.ladder.compute(&reward_input);

            let location = match (row.plate_x, row.plate_z) {
                (Some(x), Some(z)) if !x.is_nan() && !z.is_nan() => Some((x, z)),
                _ => None,
            };

            events.push(RewardedPitchEvent {
                situation,
                pitch_type: row.pitch_type.clone().unwrap_or_default(),
                location,
                description: row.description.clone(),
                events: row.events.clone(),
                reward,
            });
        }

        let mut filter_report = None;
        if options.behavioral_cloning {
            let rewards: Vec<f64> = events.iter().map(|e| e.reward).collect();
            let (keep, report) = behavioral_cloning_indices(&rewards);
            events = keep.iter().map(|&index| events[index].clone()).collect();
            filter_report = Some(report);
        }

        // Target encoding over the surviving rows only, so a class wiped
        // out by the filter does not linger in the label set. Fit over
        // these exact labels, the encode below cannot miss.
        let label_encoding = LabelEncoding::fit(events.iter().map(|e| e.pitch_type.as_str()));
        let labels: Vec<u32> = events
            .iter()
            .map(|e| label_encoding.encode(&e.pitch_type).unwrap_or(0))
            .collect();

        log::info!(
            "engineered {} training rows ({} pitch types, {} prev codes)",
            events.len(),
            label_encoding.len(),
            prev_encoding.len()
        );

        Ok(TrainingSet {
            events,
            labels,
            label_encoding,
            prev_encoding,
            filter_report,
        })
    }
}
