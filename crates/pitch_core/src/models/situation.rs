//! Pre-pitch game situation and the compact base/count/out state key

use std::fmt;

use serde::{Deserialize, Serialize};

/// Everything the models are allowed to see before a pitch is thrown.
///
/// Runner fields and handedness flags are already binarized (0 or 1);
/// `prev_pitch_type_code` uses the previous-pitch label encoding, where the
/// sentinel "no previous pitch in this at-bat" gets its own code.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Situation {
    pub inning: u8,
    pub balls: u8,
    pub strikes: u8,
    pub outs_when_up: u8,
    /// Fielding-side score minus batting-side score
    pub score_diff: i32,
    pub on_1b: u8,
    pub on_2b: u8,
    pub on_3b: u8,
    pub is_batter_lefty: u8,
    pub pitcher_throws_left: u8,
    pub prev_pitch_type_code: u32,
}

impl Situation {
    /// Feature values keyed by column name, in canonical training order.
    ///
    /// Inference pads these into whatever column order a stored artifact
    /// declares, so the names here must stay in sync with
    /// [`crate::features::FEATURE_COLUMNS`].
    pub fn feature_map(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("inning", f64::from(self.inning)),
            ("balls", f64::from(self.balls)),
            ("strikes", f64::from(self.strikes)),
            ("outs_when_up", f64::from(self.outs_when_up)),
            ("score_diff", f64::from(self.score_diff)),
            ("on_1b", f64::from(self.on_1b)),
            ("on_2b", f64::from(self.on_2b)),
            ("on_3b", f64::from(self.on_3b)),
            ("is_batter_lefty", f64::from(self.is_batter_lefty)),
            ("pitcher_throws_left", f64::from(self.pitcher_throws_left)),
            ("prev_pitch_type_code", f64::from(self.prev_pitch_type_code)),
        ]
    }

    /// Feature vector in canonical training order.
    pub fn feature_vector(&self) -> Vec<f64> {
        self.feature_map().into_iter().map(|(_, v)| v).collect()
    }
}

/// Base/count/out state used to key the run-expectancy table.
///
/// 4 ball counts x 3 strike counts x 3 out counts x 8 base configurations
/// gives the full 288-state space, though tables only store observed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameStateKey {
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub on_1b: u8,
    pub on_2b: u8,
    pub on_3b: u8,
}

impl GameStateKey {
    /// Number of distinct states in the full space
    pub const STATE_COUNT: usize = 288;

    pub fn new(balls: u8, strikes: u8, outs: u8, on_1b: u8, on_2b: u8, on_3b: u8) -> Self {
        Self {
            balls,
            strikes,
            outs,
            on_1b,
            on_2b,
            on_3b,
        }
    }

    pub fn from_situation(situation: &Situation) -> Self {
        Self {
            balls: situation.balls,
            strikes: situation.strikes,
            outs: situation.outs_when_up,
            on_1b: situation.on_1b,
            on_2b: situation.on_2b,
            on_3b: situation.on_3b,
        }
    }

    /// Parse the flat "B-S-O-1B-2B-3B" form. Returns `None` on anything
    /// that is not exactly six dash-separated integers.
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields = [0u8; 6];
        let mut parts = text.split('-');
        for slot in fields.iter_mut() {
            *slot = parts.next()?.trim().parse().ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(
            fields[0], fields[1], fields[2], fields[3], fields[4], fields[5],
        ))
    }
}

impl fmt::Display for GameStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}-{}",
            self.balls, self.strikes, self.outs, self.on_1b, self.on_2b, self.on_3b
        )
    }
}
