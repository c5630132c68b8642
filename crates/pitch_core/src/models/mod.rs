//! Core data types shared across the engine

pub mod event;
pub mod recommendation;
pub mod situation;

pub use event::{RawPitchRecord, RewardedPitchEvent};
pub use recommendation::{pitch_type_name, PrecedentMatch, Recommendation};
pub use situation::{GameStateKey, Situation};
