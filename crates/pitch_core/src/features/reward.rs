//! Per-pitch reward signal
//!
//! Rewards are computed from the pitcher's perspective by an ordered rule
//! ladder. Engineered run-value columns win over the outcome-text
//! heuristic, and the first rule that produces a signal short-circuits the
//! rest, so a corpus that mixes engineered and plain rows still gets a
//! consistent scale per row.

use serde::{Deserialize, Serialize};

/// Everything a reward rule may inspect for one pitch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardInput<'a> {
    /// Pitcher-side run value delta; positive already favors the pitcher
    pub pitcher_run_delta: Option<f64>,
    /// Batter-side run value delta; positive favors the batter
    pub batter_run_delta: Option<f64>,
    pub description: Option<&'a str>,
    pub events: Option<&'a str>,
    /// Run expectancy of the pre-pitch state (defaulted lookup)
    pub pre_pitch_expectancy: f64,
}

/// Calibrated constants of the outcome-text heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConstants {
    /// Strike reward, scaled by the risk weight
    pub strike_value: f64,
    /// Flat ball penalty
    pub ball_value: f64,
    /// Flat hit penalty
    pub hit_value: f64,
    /// Out reward, scaled by the risk weight
    pub out_value: f64,
}

impl Default for RewardConstants {
    fn default() -> Self {
        Self {
            strike_value: 0.05,
            ball_value: -0.05,
            hit_value: -1.0,
            out_value: 0.3,
        }
    }
}

/// A single reward rule. Returns `None` when its signal is absent so the
/// ladder can fall through to the next rule.
pub trait RewardRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, input: &RewardInput<'_>) -> Option<f64>;
}

/// Uses the corpus' own pitcher-side run value when present.
pub struct PitcherRunValueRule;

impl RewardRule for PitcherRunValueRule {
    fn name(&self) -> &'static str {
        "pitcher_run_value"
    }

    fn evaluate(&self, input: &RewardInput<'_>) -> Option<f64> {
        input.pitcher_run_delta.filter(|v| !v.is_nan())
    }
}

/// Negates the batter-side run value when present.
pub struct BatterRunValueRule;

impl RewardRule for BatterRunValueRule {
    fn name(&self) -> &'static str {
        "batter_run_value"
    }

    fn evaluate(&self, input: &RewardInput<'_>) -> Option<f64> {
        input.batter_run_delta.filter(|v| !v.is_nan()).map(|v| -v)
    }
}

/// Scores the outcome text, weighting strikes and outs by how dangerous
/// the pre-pitch state was (`1 + run expectancy`). Always produces a
/// value, so it terminates the ladder.
pub struct OutcomeHeuristicRule {
    pub constants: RewardConstants,
}

impl OutcomeHeuristicRule {
    pub fn new(constants: RewardConstants) -> Self {
        Self { constants }
    }
}

impl RewardRule for OutcomeHeuristicRule {
    fn name(&self) -> &'static str {
        "outcome_heuristic"
    }

    fn evaluate(&self, input: &RewardInput<'_>) -> Option<f64> {
        let description = input.description.unwrap_or("").to_lowercase();
        let events = input.events.unwrap_or("").to_lowercase();
        let risk_weight = 1.0 + input.pre_pitch_expectancy;
        let c = &self.constants;

        let reward = if description.contains("strike") {
            c.strike_value * risk_weight
        } else if description.contains("ball") {
            c.ball_value
        } else if description.contains("hit")
            || events.contains("single")
            || events.contains("double")
            || events.contains("home_run")
        {
            c.hit_value
        } else if events.contains("out") {
            c.out_value * risk_weight
        } else {
            0.0
        };
        Some(reward)
    }
}

/// Priority-ordered rule list; the first rule producing a value wins.
pub struct RewardLadder {
    rules: Vec<Box<dyn RewardRule>>,
}

impl RewardLadder {
    /// Standard ladder: pitcher-side delta, then negated batter-side
    /// delta, then the outcome heuristic.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Box::new(PitcherRunValueRule),
                Box::new(BatterRunValueRule),
                Box::new(OutcomeHeuristicRule::new(RewardConstants::default())),
            ],
        }
    }

    /// A custom rule ordering. The last rule should always produce a value
    /// or rows without engineered columns score zero.
    pub fn with_rules(rules: Vec<Box<dyn RewardRule>>) -> Self {
        Self { rules }
    }

    pub fn compute(&self, input: &RewardInput<'_>) -> f64 {
        for rule in &self.rules {
            if let Some(value) = rule.evaluate(input) {
                log::trace!("reward rule '{}' fired: {:.4}", rule.name(), value);
                return value;
            }
        }
        0.0
    }
}

impl Default for RewardLadder {
    fn default() -> Self {
        Self::standard()
    }
}
