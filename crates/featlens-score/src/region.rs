#![forbid(unsafe_code)]

//! Threshold-region classification.
//!
//! `n` strictly increasing thresholds cut the value axis into `n + 1`
//! regions. A value equal to a threshold belongs to the region above it.

use featlens_core::bucket_index;
use serde::{Deserialize, Serialize};

/// Named region relative to a set of thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdRegion {
    /// Below the first threshold.
    Below,
    /// Between the first and last threshold.
    Between,
    /// At or above the last threshold.
    Above,
}

impl ThresholdRegion {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Below => "Below",
            Self::Between => "Between",
            Self::Above => "Above",
        }
    }
}

/// 0-based region index of `value`.
#[must_use]
pub fn region_index(value: f64, thresholds: &[f64]) -> usize {
    bucket_index(value, thresholds)
}

/// Named region of `value`. With no thresholds everything is `Below`.
#[must_use]
pub fn classify_region(value: f64, thresholds: &[f64]) -> ThresholdRegion {
    region_for_index(region_index(value, thresholds), thresholds.len())
}

/// Name of region `index` out of `thresholds + 1` regions.
#[must_use]
pub fn region_for_index(index: usize, thresholds: usize) -> ThresholdRegion {
    if index == 0 {
        ThresholdRegion::Below
    } else if index >= thresholds {
        ThresholdRegion::Above
    } else {
        ThresholdRegion::Between
    }
}

/// Fill opacity of region `index`: `0.25 + 0.5 * index / thresholds`.
#[must_use]
pub fn region_opacity(index: usize, thresholds: usize) -> f64 {
    if thresholds == 0 {
        return 0.25;
    }
    0.25 + 0.5 * index.min(thresholds) as f64 / thresholds as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_thresholds_three_regions() {
        let t = [0.3, 0.7];
        assert_eq!(classify_region(0.1, &t), ThresholdRegion::Below);
        assert_eq!(classify_region(0.3, &t), ThresholdRegion::Between);
        assert_eq!(classify_region(0.69, &t), ThresholdRegion::Between);
        assert_eq!(classify_region(0.7, &t), ThresholdRegion::Above);
    }

    #[test]
    fn single_threshold_has_no_between() {
        assert_eq!(classify_region(0.4, &[0.5]), ThresholdRegion::Below);
        assert_eq!(classify_region(0.5, &[0.5]), ThresholdRegion::Above);
    }

    #[test]
    fn opacity_ramps() {
        assert_eq!(region_opacity(0, 2), 0.25);
        assert_eq!(region_opacity(1, 2), 0.5);
        assert_eq!(region_opacity(2, 2), 0.75);
        assert_eq!(region_opacity(1, 1), 0.75);
    }

    #[test]
    fn region_serializes_by_variant_name() {
        let json = serde_json::to_value(ThresholdRegion::Between).unwrap();
        assert_eq!(json, serde_json::json!("Between"));
        let back: ThresholdRegion = serde_json::from_str("\"Above\"").unwrap();
        assert_eq!(back, ThresholdRegion::Above);
    }
}
