#![forbid(unsafe_code)]

//! Score and statistics derivation.
//!
//! Turns backend distribution statistics into normalized bimodality scores,
//! ordinal levels, and threshold-region classifications. Every function here
//! is pure.

pub mod bimodality;
pub mod level;
pub mod region;

pub use bimodality::{
    BimodalityScore, MultimodalityScore, calculate_bimodality_score,
    calculate_multimodality_score,
};
pub use level::{BIMODAL_GATE, ScoreLevel, get_score_level, is_bimodal_score, is_bimodal_with_gate};
pub use region::{
    ThresholdRegion, classify_region, region_for_index, region_index, region_opacity,
};
