//! Raw corpus rows and engineered training events

use serde::{Deserialize, Serialize};

use super::situation::{GameStateKey, Situation};

/// One row of the historical pitch corpus as it arrives from the event
/// store.
///
/// Everything situational or outcome-related is optional at this layer; the
/// feature engineer applies the cleaning defaults. The three id fields
/// (`game_pk`, `at_bat_number`, `pitch_number`) define chronological order
/// within the corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPitchRecord {
    pub game_pk: i64,
    pub at_bat_number: i32,
    pub pitch_number: i32,
    /// Target label (short pitch-type code such as "FF"); rows without one
    /// are dropped before training
    pub pitch_type: Option<String>,
    pub inning: Option<u8>,
    /// "Top" or "Bot"
    pub inning_topbot: Option<String>,
    pub balls: Option<u8>,
    pub strikes: Option<u8>,
    pub outs_when_up: Option<u8>,
    /// Raw feeds put a runner id here, not a flag
    pub on_1b: Option<f64>,
    pub on_2b: Option<f64>,
    pub on_3b: Option<f64>,
    /// Batter side, "L" or "R"
    pub stand: Option<String>,
    /// Pitcher hand, "L" or "R"
    pub p_throws: Option<String>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub bat_score: Option<i32>,
    pub fld_score: Option<i32>,
    /// Per-pitch outcome text ("called_strike", "hit_into_play", ...)
    pub description: Option<String>,
    /// Plate-appearance outcome, only set on the final pitch
    pub events: Option<String>,
    /// Batter-side run value delta, when the feed engineers it
    pub delta_run_exp: Option<f64>,
    /// Pitcher-side run value delta, when the feed engineers it
    pub delta_pitcher_run_exp: Option<f64>,
    pub plate_x: Option<f64>,
    pub plate_z: Option<f64>,
}

impl RawPitchRecord {
    /// Binarize a raw runner field: any non-null, non-zero value means the
    /// base is occupied (feeds carry runner ids there).
    pub fn runner_flag(value: Option<f64>) -> u8 {
        match value {
            Some(v) if v != 0.0 && !v.is_nan() => 1,
            _ => 0,
        }
    }

    /// Base/count/out key of the pre-pitch state, with missing counts
    /// treated as zero.
    pub fn game_state_key(&self) -> GameStateKey {
        GameStateKey::new(
            self.balls.unwrap_or(0),
            self.strikes.unwrap_or(0),
            self.outs_when_up.unwrap_or(0),
            Self::runner_flag(self.on_1b),
            Self::runner_flag(self.on_2b),
            Self::runner_flag(self.on_3b),
        )
    }

    /// Chronological sort key.
    pub fn sort_key(&self) -> (i64, i32, i32) {
        (self.game_pk, self.at_bat_number, self.pitch_number)
    }

    /// Cumulative runs on the scoreboard when this pitch was thrown.
    pub fn runs_before_pitch(&self) -> i32 {
        self.home_score.unwrap_or(0) + self.away_score.unwrap_or(0)
    }

    /// Identity of the half-inning this pitch belongs to.
    pub fn half_inning_id(&self) -> (i64, u8, bool) {
        let is_top = self
            .inning_topbot
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("top"))
            .unwrap_or(false);
        (self.game_pk, self.inning.unwrap_or(0), is_top)
    }
}

/// A fully engineered training row: the situation, what was actually thrown
/// and where, the outcome text, and the computed reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardedPitchEvent {
    pub situation: Situation,
    /// Short code of the pitch that was actually thrown
    pub pitch_type: String,
    /// Plate crossing point (x, z) in feet, when the corpus recorded one
    pub location: Option<(f64, f64)>,
    pub description: Option<String>,
    pub events: Option<String>,
    /// Pitcher-perspective reward for this pitch
    pub reward: f64,
}
