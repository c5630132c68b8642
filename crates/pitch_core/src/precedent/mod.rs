//! Historical precedent retrieval
//!
//! Alongside each recommendation the caller can pull past pitches of the
//! same type thrown in the same spot of a game. Matching runs in two
//! passes: a strict pass over count, outs, runner configuration, and
//! inning, then, when that returns fewer than `max_results` rows, a
//! relaxed pass over count alone whose results replace the strict set.
//! Rows are ranked by tracking quality so the cleanest clips surface
//! first.

use crate::models::{PrecedentMatch, Situation};

/// A history row missing a field cannot be disqualified on it.
fn field_matches(recorded: Option<u8>, wanted: u8) -> bool {
    match recorded {
        Some(value) => value == wanted,
        None => true,
    }
}

fn matches_count(row: &PrecedentMatch, situation: &Situation, pitch_type: &str) -> bool {
    row.pitch_type == pitch_type
        && field_matches(row.balls, situation.balls)
        && field_matches(row.strikes, situation.strikes)
}

fn matches_strict(row: &PrecedentMatch, situation: &Situation, pitch_type: &str) -> bool {
    matches_count(row, situation, pitch_type)
        && field_matches(row.outs_when_up, situation.outs_when_up)
        && field_matches(row.on_1b, situation.on_1b)
        && field_matches(row.on_2b, situation.on_2b)
        && field_matches(row.on_3b, situation.on_3b)
        && field_matches(row.inning, situation.inning)
}

fn quality(row: &PrecedentMatch) -> f64 {
    row.detection_rate.unwrap_or(f64::NEG_INFINITY)
}

/// Retrieves up to `max_results` precedents for throwing `pitch_type` in
/// `situation`, best tracking quality first. Returns an empty vector when
/// even the relaxed pass finds nothing.
pub fn find_similar(
    history: &[PrecedentMatch],
    situation: &Situation,
    pitch_type: &str,
    max_results: usize,
) -> Vec<PrecedentMatch> {
    let mut found: Vec<PrecedentMatch> = history
        .iter()
        .filter(|row| matches_strict(row, situation, pitch_type))
        .cloned()
        .collect();

    if found.len() < max_results {
        // The relaxed set is a superset of the strict one, so it replaces
        // rather than extends it.
        found = history
            .iter()
            .filter(|row| matches_count(row, situation, pitch_type))
            .cloned()
            .collect();
        log::debug!(
            "precedent search relaxed to count-only: {} rows for {} at {}-{}",
            found.len(),
            pitch_type,
            situation.balls,
            situation.strikes
        );
    }

    found.sort_by(|a, b| quality(b).total_cmp(&quality(a)));
    found.truncate(max_results);
    found
}
