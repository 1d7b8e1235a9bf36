#![forbid(unsafe_code)]

//! Ordinal buckets for bimodality scores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bounds of levels 6 down to 2. Anything below the last is level 1.
pub const LEVEL_THRESHOLDS: [f64; 5] = [0.80, 0.65, 0.50, 0.30, 0.15];

/// Minimum score that unlocks bulk Tag-All actions.
pub const BIMODAL_GATE: f64 = 0.83;

/// Six ordinal levels, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreLevel {
    Unimodal = 1,
    Weak = 2,
    Mild = 3,
    Moderate = 4,
    Likely = 5,
    Strong = 6,
}

impl ScoreLevel {
    pub const ALL: [ScoreLevel; 6] = [
        Self::Unimodal,
        Self::Weak,
        Self::Mild,
        Self::Moderate,
        Self::Likely,
        Self::Strong,
    ];

    /// 1-based level number.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unimodal => "Unimodal",
            Self::Weak => "Weakly bimodal",
            Self::Mild => "Mildly bimodal",
            Self::Moderate => "Moderately bimodal",
            Self::Likely => "Likely bimodal",
            Self::Strong => "Strongly bimodal",
        }
    }
}

impl fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket a score into one of six levels.
#[must_use]
pub fn get_score_level(score: f64) -> ScoreLevel {
    let levels = [
        ScoreLevel::Strong,
        ScoreLevel::Likely,
        ScoreLevel::Moderate,
        ScoreLevel::Mild,
        ScoreLevel::Weak,
    ];
    LEVEL_THRESHOLDS
        .iter()
        .zip(levels)
        .find(|&(&t, _)| score >= t)
        .map_or(ScoreLevel::Unimodal, |(_, level)| level)
}

/// Whether Tag-All affordances are unlocked for this score.
#[must_use]
pub fn is_bimodal_score(score: f64) -> bool {
    is_bimodal_with_gate(score, BIMODAL_GATE)
}

/// [`is_bimodal_score`] with a caller-supplied gate.
#[must_use]
pub fn is_bimodal_with_gate(score: f64, gate: f64) -> bool {
    score >= gate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_boundaries() {
        assert_eq!(get_score_level(0.80), ScoreLevel::Strong);
        assert_eq!(get_score_level(0.7999), ScoreLevel::Likely);
        assert_eq!(get_score_level(0.65), ScoreLevel::Likely);
        assert_eq!(get_score_level(0.50), ScoreLevel::Moderate);
        assert_eq!(get_score_level(0.30), ScoreLevel::Mild);
        assert_eq!(get_score_level(0.15), ScoreLevel::Weak);
        assert_eq!(get_score_level(0.1499), ScoreLevel::Unimodal);
        assert_eq!(get_score_level(f64::NAN), ScoreLevel::Unimodal);
    }

    #[test]
    fn gate_is_stricter_than_level_six() {
        assert_eq!(get_score_level(0.81), ScoreLevel::Strong);
        assert!(!is_bimodal_score(0.81));
        assert!(is_bimodal_score(0.83));
    }

    #[test]
    fn values_are_one_based() {
        let values: Vec<u8> = ScoreLevel::ALL.iter().map(|l| l.value()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(ScoreLevel::Strong.to_string(), "Strongly bimodal");
    }

    #[test]
    fn level_serializes_by_variant_name() {
        let json = serde_json::to_value(ScoreLevel::Strong).unwrap();
        assert_eq!(json, serde_json::json!("Strong"));
        for level in ScoreLevel::ALL {
            let text = serde_json::to_string(&level).unwrap();
            let back: ScoreLevel = serde_json::from_str(&text).unwrap();
            assert_eq!(back, level);
        }
    }
}
