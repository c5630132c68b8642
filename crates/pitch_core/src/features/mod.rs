//! Feature engineering pipeline: schema, encodings, rewards, filtering

pub mod encoding;
pub mod engineer;
pub mod filter;
pub mod reward;
pub mod schema;

pub use encoding::{LabelEncoding, NO_PITCH};
pub use engineer::{EngineerOptions, FeatureEngineer, TrainingSet};
pub use filter::{behavioral_cloning_indices, median, FilterReport};
pub use reward::{
    BatterRunValueRule, OutcomeHeuristicRule, PitcherRunValueRule, RewardConstants, RewardInput,
    RewardLadder, RewardRule,
};
pub use schema::{
    leakage_suspects, warn_on_leakage, FEATURE_COLUMNS, PITCH_TYPE_CODE_COLUMN,
};
