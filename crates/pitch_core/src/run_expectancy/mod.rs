//! Run-expectancy (RE288) table
//!
//! Expected runs scored in the remainder of a half-inning, keyed by the
//! 288 base/count/out states. Built once from league play-by-play data,
//! persisted as a flat CSV, and consulted at training time to weight
//! rewards by how dangerous the pre-pitch situation was.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PitchError, Result};
use crate::models::{GameStateKey, RawPitchRecord};

/// Value returned for states the source data never observed.
///
/// Roughly the league-average run expectancy of a neutral state; a lookup
/// miss is expected for rare states and is never an error.
pub const DEFAULT_RUN_EXPECTANCY: f64 = 0.5;

/// One aggregated state entry. `sample_size` is diagnostic only and does
/// not affect lookups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReEntry {
    pub expected_runs: f64,
    pub sample_size: u64,
}

/// The run-expectancy table. Only observed states are stored; everything
/// else falls back to [`DEFAULT_RUN_EXPECTANCY`].
#[derive(Debug, Clone, Default)]
pub struct RETable {
    entries: FxHashMap<GameStateKey, ReEntry>,
}

impl RETable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: GameStateKey, entry: ReEntry) {
        self.entries.insert(key, entry);
    }

    /// Expected runs for a state, defaulting when the state was never seen.
    pub fn lookup(&self, key: &GameStateKey) -> f64 {
        self.entries
            .get(key)
            .map(|e| e.expected_runs)
            .unwrap_or(DEFAULT_RUN_EXPECTANCY)
    }

    pub fn entry(&self, key: &GameStateKey) -> Option<&ReEntry> {
        self.entries.get(key)
    }

    /// All populated states, in arbitrary map order.
    pub fn entries(&self) -> impl Iterator<Item = (&GameStateKey, &ReEntry)> {
        self.entries.iter()
    }

    /// Build the table from raw play-by-play rows.
    ///
    /// Each half-inning's final cumulative run total is found first; every
    /// pitch then contributes `final_runs - runs_at_pitch` to the average
    /// of its pre-pitch state. Rows do not need pitch-type labels.
    pub fn build(records: &[RawPitchRecord]) -> Self {
        let mut final_runs: FxHashMap<(i64, u8, bool), i32> = FxHashMap::default();
        for record in records {
            let runs = record.runs_before_pitch();
            let slot = final_runs.entry(record.half_inning_id()).or_insert(runs);
            if runs > *slot {
                *slot = runs;
            }
        }

        let mut sums: FxHashMap<GameStateKey, (f64, u64)> = FxHashMap::default();
        for record in records {
            let end = final_runs
                .get(&record.half_inning_id())
                .copied()
                .unwrap_or(0);
            let remaining = f64::from(end - record.runs_before_pitch());
            let slot = sums.entry(record.game_state_key()).or_insert((0.0, 0));
            slot.0 += remaining;
            slot.1 += 1;
        }

        let entries = sums
            .into_iter()
            .map(|(key, (sum, count))| {
                (
                    key,
                    ReEntry {
                        expected_runs: sum / count as f64,
                        sample_size: count,
                    },
                )
            })
            .collect();

        Self { entries }
    }

    /// Write the flat CSV form (`state,re_value,sample_size`), atomically
    /// via a temp file plus rename. Rows are ordered by state key so the
    /// output is byte-stable across runs.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| PitchError::Io(format!("create {}: {}", parent.display(), e)))?;
            }
        }

        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)
                .map_err(|e| PitchError::Io(format!("open {}: {}", tmp_path.display(), e)))?;
            writer
                .write_record(["state", "re_value", "sample_size"])
                .map_err(|e| PitchError::Io(e.to_string()))?;

            let mut rows: Vec<(String, &ReEntry)> = self
                .entries
                .iter()
                .map(|(key, entry)| (key.to_string(), entry))
                .collect();
            rows.sort_by(|a, b| a.0.cmp(&b.0));

            for (state, entry) in rows {
                writer
                    .write_record([
                        state,
                        entry.expected_runs.to_string(),
                        entry.sample_size.to_string(),
                    ])
                    .map_err(|e| PitchError::Io(e.to_string()))?;
            }
            writer.flush().map_err(|e| PitchError::Io(e.to_string()))?;
        }
        fs::rename(&tmp_path, path)
            .map_err(|e| PitchError::Io(format!("rename to {}: {}", path.display(), e)))?;

        log::info!("run-expectancy table saved: {} states", self.len());
        Ok(())
    }

    /// Load a previously persisted table. A missing file, wrong header, or
    /// malformed row is a data-integrity failure; states absent from the
    /// file are simply not present.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let source = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| PitchError::DataIntegrity {
                source: source.clone(),
                detail: format!("cannot open: {}", e),
            })?;

        let headers = reader
            .headers()
            .map_err(|e| PitchError::DataIntegrity {
                source: source.clone(),
                detail: format!("cannot read header: {}", e),
            })?
            .clone();
        if headers.get(0) != Some("state") || headers.get(1) != Some("re_value") {
            return Err(PitchError::DataIntegrity {
                source,
                detail: format!(
                    "expected header 'state,re_value,...', found '{}'",
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            });
        }

        let mut table = Self::new();
        for (index, row) in reader.records().enumerate() {
            let line = index + 2;
            let row = row.map_err(|e| PitchError::DataIntegrity {
                source: source.clone(),
                detail: format!("line {}: {}", line, e),
            })?;

            let state_text = row.get(0).unwrap_or("");
            let key = GameStateKey::parse(state_text).ok_or_else(|| PitchError::DataIntegrity {
                source: source.clone(),
                detail: format!("line {}: malformed state key '{}'", line, state_text),
            })?;

            let value_text = row.get(1).unwrap_or("");
            let expected_runs: f64 =
                value_text
                    .trim()
                    .parse()
                    .map_err(|_| PitchError::DataIntegrity {
                        source: source.clone(),
                        detail: format!("line {}: malformed re_value '{}'", line, value_text),
                    })?;

            // Diagnostic column, tolerated when absent from older files.
            let sample_size: u64 = row
                .get(2)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);

            table.insert(
                key,
                ReEntry {
                    expected_runs,
                    sample_size,
                },
            );
        }

        log::info!(
            "run-expectancy table loaded: {} states from {}",
            table.len(),
            source
        );
        Ok(table)
    }
}
