//! Corpus ingest - pitch-by-pitch CSV files into engine records
//!
//! Event-store exports carry 90+ columns; only the situational and
//! outcome columns the engine reads are extracted, by header name so
//! column order never matters. Cells are optional at this layer, and the
//! cleaning defaults live in the feature engineer, not here. Rows that
//! cannot be sequenced (no game/at-bat/pitch identity) are skipped with a
//! warning rather than failing the whole file.

use anyhow::{Context, Result};
use pitch_core::models::{PrecedentMatch, RawPitchRecord};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Training target column. A corpus file without it cannot train anything.
pub const TARGET_COLUMN: &str = "pitch_type";

/// CSV parsing statistics
#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

/// One CSV record with name-based cell access. Empty cells and the usual
/// NA spellings read as missing.
struct Row<'a> {
    record: &'a csv::StringRecord,
    columns: &'a FxHashMap<String, usize>,
}

impl<'a> Row<'a> {
    fn cell(&self, name: &str) -> Option<&'a str> {
        let index = *self.columns.get(name)?;
        let value = self.record.get(index)?.trim();
        (!matches!(value, "" | "NA" | "NaN" | "null")).then_some(value)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.cell(name).map(str::to_string)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.cell(name).and_then(|v| v.parse().ok())
    }

    fn count(&self, name: &str) -> Option<u8> {
        self.number(name).map(|v| v as u8)
    }

    fn score(&self, name: &str) -> Option<i32> {
        self.number(name).map(|v| v as i32)
    }

    /// Occupancy flag for a runner column. Feeds put a runner id in the
    /// cell, so any non-empty value means the base is taken; a file without
    /// the column at all reads as unknown.
    fn runner(&self, name: &str) -> Option<u8> {
        self.columns
            .contains_key(name)
            .then(|| RawPitchRecord::runner_flag(self.number(name)))
    }
}

fn column_index(headers: &csv::StringRecord) -> FxHashMap<String, usize> {
    let mut columns = FxHashMap::default();
    for (index, name) in headers.iter().enumerate() {
        // Strip BOM from the first header cell
        let name = name.trim().trim_start_matches('\u{feff}');
        columns.insert(name.to_string(), index);
    }
    columns
}

/// Parse a pitch-by-pitch corpus export into engine records.
///
/// # Arguments
///
/// * `csv_path` - Path to the corpus CSV (one row per pitch)
///
/// # Returns
///
/// * `Ok((Vec<RawPitchRecord>, ParseStats))` - Parsed rows and statistics
/// * `Err` - File I/O error, missing target column, or zero usable rows
pub fn parse_corpus_csv(csv_path: &Path) -> Result<(Vec<RawPitchRecord>, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", csv_path.display()))?
        .clone();
    let columns = column_index(&headers);
    if !columns.contains_key(TARGET_COLUMN) {
        anyhow::bail!(
            "CSV is missing the '{}' column: {}",
            TARGET_COLUMN,
            csv_path.display()
        );
    }

    let mut rows = Vec::new();
    let mut stats = ParseStats::default();

    for result in reader.records() {
        stats.total_rows += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                stats.failed += 1;
                eprintln!("Warning: Line {} - {}", stats.total_rows, e);
                continue;
            }
        };
        let row = Row {
            record: &record,
            columns: &columns,
        };

        // Rows without the ordering identity cannot be sequenced
        let (Some(game_pk), Some(at_bat_number), Some(pitch_number)) = (
            row.number("game_pk"),
            row.number("at_bat_number"),
            row.number("pitch_number"),
        ) else {
            stats.failed += 1;
            eprintln!(
                "Warning: Line {} - missing game_pk/at_bat_number/pitch_number, skipping",
                stats.total_rows
            );
            continue;
        };

        rows.push(RawPitchRecord {
            game_pk: game_pk as i64,
            at_bat_number: at_bat_number as i32,
            pitch_number: pitch_number as i32,
            pitch_type: row.text(TARGET_COLUMN),
            inning: row.count("inning"),
            inning_topbot: row.text("inning_topbot"),
            balls: row.count("balls"),
            strikes: row.count("strikes"),
            outs_when_up: row.count("outs_when_up"),
            on_1b: row.number("on_1b"),
            on_2b: row.number("on_2b"),
            on_3b: row.number("on_3b"),
            stand: row.text("stand"),
            p_throws: row.text("p_throws"),
            home_score: row.score("home_score"),
            away_score: row.score("away_score"),
            bat_score: row.score("bat_score"),
            fld_score: row.score("fld_score"),
            description: row.text("description"),
            events: row.text("events"),
            delta_run_exp: row.number("delta_run_exp"),
            delta_pitcher_run_exp: row.number("delta_pitcher_run_exp"),
            plate_x: row.number("plate_x"),
            plate_z: row.number("plate_z"),
        });
        stats.parsed += 1;
    }

    if rows.is_empty() {
        anyhow::bail!("No usable rows in {}", csv_path.display());
    }
    Ok((rows, stats))
}

/// Parse a pitch history export into precedent records.
///
/// History files come from a different pipeline than the training corpus
/// (they carry clip paths and tracking quality), so missing columns are
/// normal; a precedent with an unrecorded field simply cannot be
/// disqualified on it. Rows without a pitch type are skipped since they
/// can never match a query.
pub fn parse_history_csv(csv_path: &Path) -> Result<(Vec<PrecedentMatch>, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open history CSV: {}", csv_path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", csv_path.display()))?
        .clone();
    let columns = column_index(&headers);

    let mut rows = Vec::new();
    let mut stats = ParseStats::default();

    for result in reader.records() {
        stats.total_rows += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                stats.failed += 1;
                eprintln!("Warning: Line {} - {}", stats.total_rows, e);
                continue;
            }
        };
        let row = Row {
            record: &record,
            columns: &columns,
        };

        let Some(pitch_type) = row.text(TARGET_COLUMN) else {
            stats.failed += 1;
            eprintln!(
                "Warning: Line {} - history row has no pitch_type, skipping",
                stats.total_rows
            );
            continue;
        };

        rows.push(PrecedentMatch {
            pitch_type,
            game_date: row.text("game_date"),
            balls: row.count("balls"),
            strikes: row.count("strikes"),
            outs_when_up: row.count("outs_when_up"),
            inning: row.count("inning"),
            on_1b: row.runner("on_1b"),
            on_2b: row.runner("on_2b"),
            on_3b: row.runner("on_3b"),
            video_path: row.text("output_video_path"),
            release_angle: row.number("calculated_release_angle"),
            detection_rate: row.number("detection_rate"),
            description: row.text("description").or_else(|| row.text("des")),
        });
        stats.parsed += 1;
    }

    Ok((rows, stats))
}
