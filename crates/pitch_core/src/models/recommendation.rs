//! Recommendation output types and historical precedent records

use serde::{Deserialize, Serialize};

/// One ranked entry returned by the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based rank
    pub rank: usize,
    /// Short pitch-type code from the classifier's label set
    pub pitch_type: String,
    /// Raw ensemble probability, not renormalized over the top-k
    pub probability: f64,
    /// Suggested plate crossing point (x, z) in feet
    pub target_location: (f64, f64),
}

/// A historical pitch retrieved as supporting evidence for a
/// recommendation. Optional fields reflect whatever the history file
/// carried; `video_path` is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecedentMatch {
    pub pitch_type: String,
    pub game_date: Option<String>,
    pub balls: Option<u8>,
    pub strikes: Option<u8>,
    pub outs_when_up: Option<u8>,
    pub inning: Option<u8>,
    pub on_1b: Option<u8>,
    pub on_2b: Option<u8>,
    pub on_3b: Option<u8>,
    pub video_path: Option<String>,
    pub release_angle: Option<f64>,
    /// Tracking quality of the clip, used to rank retrieved precedents
    pub detection_rate: Option<f64>,
    pub description: Option<String>,
}

/// Human-readable name for a short pitch-type code. Unknown codes come back
/// unchanged.
pub fn pitch_type_name(code: &str) -> &str {
    match code {
        "FF" => "Four-Seam Fastball",
        "SL" => "Slider",
        "CU" => "Curveball",
        "CH" => "Changeup",
        "SI" => "Sinker",
        "FC" => "Cutter",
        "ST" => "Sweeper",
        "FS" => "Splitter",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_type_name_known_codes() {
        assert_eq!(pitch_type_name("FF"), "Four-Seam Fastball");
        assert_eq!(pitch_type_name("ST"), "Sweeper");
        assert_eq!(pitch_type_name("FS"), "Splitter");
    }

    #[test]
    fn test_pitch_type_name_passes_unknown_through() {
        assert_eq!(pitch_type_name("KN"), "KN");
        assert_eq!(pitch_type_name(""), "");
    }

    #[test]
    fn test_recommendation_serializes_named_fields() {
        let rec = Recommendation {
            rank: 1,
            pitch_type: "SL".to_string(),
            probability: 0.42,
            target_location: (-0.5, 2.1),
        };
        let json = serde_json::to_string(&rec).expect("serialize");
        assert!(json.contains("\"pitch_type\":\"SL\""));
        assert!(json.contains("\"rank\":1"));
    }
}
