//! Fixed model feature schema and the outcome-leakage guard

/// The situational features every model trains on, in canonical order.
///
/// Stored artifacts persist this list so inference can pad a
/// [`crate::models::Situation`] into the exact column order the forest saw
/// at fit time.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "inning",
    "balls",
    "strikes",
    "outs_when_up",
    "score_diff",
    "on_1b",
    "on_2b",
    "on_3b",
    "is_batter_lefty",
    "pitcher_throws_left",
    "prev_pitch_type_code",
];

/// Extra column appended for the location model: the candidate pitch-type
/// code. Deliberately not part of [`FEATURE_COLUMNS`].
pub const PITCH_TYPE_CODE_COLUMN: &str = "pitch_type_code";

/// Name fragments that indicate post-pitch information: velocity, spin,
/// plate crossing, zone, and outcome text columns.
const LEAKAGE_FRAGMENTS: [&str; 6] = ["speed", "spin", "plate", "zone", "event", "des"];

/// Subset of `names` that look like post-pitch outcome columns.
pub fn leakage_suspects(names: &[String]) -> Vec<&str> {
    names
        .iter()
        .filter(|name| {
            let lowered = name.to_lowercase();
            LEAKAGE_FRAGMENTS
                .iter()
                .any(|fragment| lowered.contains(fragment))
        })
        .map(String::as_str)
        .collect()
}

/// Warn when a stored schema carries suspicious columns. Advisory only:
/// padding still follows the stored schema.
pub fn warn_on_leakage(names: &[String]) {
    let suspects = leakage_suspects(names);
    if !suspects.is_empty() {
        log::warn!(
            "feature schema contains possible outcome leakage: {:?}",
            suspects
        );
    }
}
