#![forbid(unsafe_code)]

//! Bimodality score from dip test, BIC comparison, and GMM mean separation.
//!
//! # Mathematical model
//!
//! Three sub-scores, each normalized to `[0, 1]`:
//!
//! ```text
//! dip   = 1 - min(p / 0.05, 1)
//! bic   = clamp(10 * (BIC_k1 - BIC_k2) / |BIC_k1|, 0, 1)
//! mean  = clamp(d / 2, 0, 1),   d = |mu1 - mu2| / ((sigma1 + sigma2) / 2)
//! score = (dip * bic * mean)^(1/3)
//! ```
//!
//! The geometric mean is zero whenever any sub-score is zero, so all three
//! signals must agree for a high score. Variances are floored at `1e-4`.
//!
//! # Failure Modes
//!
//! | Condition                  | Behavior                       |
//! |----------------------------|--------------------------------|
//! | `sample_size < 10`         | every field is `0.0`           |
//! | `BIC_k1 == 0` or NaN input | the affected sub-score is `0`  |
//! | fewer than 2 components    | mean sub-score is `0`          |

use featlens_core::{BimodalityInfo, CategoryBimodality};
use serde::{Deserialize, Serialize};

/// Minimum sample size for a non-zero score.
pub const MIN_SAMPLE_SIZE: usize = 10;
/// Dip p-value at which the dip sub-score reaches zero.
pub const DIP_SIGNIFICANCE: f64 = 0.05;
/// Lower bound applied to component variances.
pub const VARIANCE_FLOOR: f64 = 0.0001;

/// Combined score and its parts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BimodalityScore {
    /// Geometric mean of the three sub-scores, in `[0, 1]`.
    pub score: f64,
    pub dip_score: f64,
    pub bic_score: f64,
    pub mean_score: f64,
    /// Cohen's-d-like separation of the first two mixture components.
    pub mean_separation: f64,
    /// `BIC_k1 - BIC_k2`; positive favors two components.
    pub bic_diff: f64,
}

/// Score one distribution.
#[must_use]
pub fn calculate_bimodality_score(info: &BimodalityInfo) -> BimodalityScore {
    if info.sample_size < MIN_SAMPLE_SIZE {
        tracing::trace!(sample_size = info.sample_size, "bimodality.insufficient_sample");
        return BimodalityScore::default();
    }

    let dip_score = dip_score(info.dip_pvalue);
    let bic_diff = info.bic_k1 - info.bic_k2;
    let bic_score = bic_score(info.bic_k1, info.bic_k2);
    let mean_separation = mean_separation(info);
    let mean_score = finite_or_zero(mean_separation / 2.0).clamp(0.0, 1.0);

    let score = (dip_score * bic_score * mean_score).cbrt();

    BimodalityScore {
        score: finite_or_zero(score).clamp(0.0, 1.0),
        dip_score,
        bic_score,
        mean_score,
        mean_separation,
        bic_diff: finite_or_zero(bic_diff),
    }
}

/// `1 - min(p / 0.05, 1)`; a NaN p-value scores zero.
#[must_use]
pub fn dip_score(p_value: f64) -> f64 {
    if p_value.is_nan() {
        return 0.0;
    }
    1.0 - (p_value.max(0.0) / DIP_SIGNIFICANCE).min(1.0)
}

/// Relative BIC improvement of two components over one, scaled by 10.
#[must_use]
pub fn bic_score(bic_k1: f64, bic_k2: f64) -> f64 {
    if bic_k1 == 0.0 || !bic_k1.is_finite() || !bic_k2.is_finite() {
        return 0.0;
    }
    (10.0 * (bic_k1 - bic_k2) / bic_k1.abs()).clamp(0.0, 1.0)
}

/// `|mu1 - mu2| / avg(sigma)` over the first two GMM components.
#[must_use]
pub fn mean_separation(info: &BimodalityInfo) -> f64 {
    let [a, b] = match info.gmm_components.as_slice() {
        [a, b, ..] => [a, b],
        _ => return 0.0,
    };
    let sigma_a = a.variance.max(VARIANCE_FLOOR).sqrt();
    let sigma_b = b.variance.max(VARIANCE_FLOOR).sqrt();
    let avg_std = (sigma_a + sigma_b) / 2.0;
    finite_or_zero((a.mean - b.mean).abs() / avg_std)
}

/// Aggregate over categories of a multi-category metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultimodalityScore {
    /// Arithmetic mean of the per-category scores.
    pub score: f64,
    pub categories: Vec<(String, BimodalityScore)>,
}

/// Score each category, then average arithmetically. Empty input scores 0.
#[must_use]
pub fn calculate_multimodality_score(categories: &[CategoryBimodality]) -> MultimodalityScore {
    let scored: Vec<(String, BimodalityScore)> = categories
        .iter()
        .map(|c| (c.category.clone(), calculate_bimodality_score(&c.bimodality)))
        .collect();
    let score = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|(_, s)| s.score).sum::<f64>() / scored.len() as f64
    };
    MultimodalityScore {
        score,
        categories: scored,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use featlens_core::GmmComponent;

    fn info(p: f64, k1: f64, k2: f64, n: usize) -> BimodalityInfo {
        BimodalityInfo {
            dip_pvalue: p,
            bic_k1: k1,
            bic_k2: k2,
            gmm_components: vec![
                GmmComponent::new(0.2, 0.01, 0.5),
                GmmComponent::new(0.8, 0.01, 0.5),
            ],
            sample_size: n,
        }
    }

    #[test]
    fn small_sample_scores_zero() {
        let s = calculate_bimodality_score(&info(0.0, 100.0, 50.0, 9));
        assert_eq!(s, BimodalityScore::default());
    }

    #[test]
    fn dip_at_significance_is_zero() {
        let s = calculate_bimodality_score(&info(0.05, 100.0, 50.0, 10));
        assert_eq!(s.dip_score, 0.0);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn strong_signals_score_high() {
        let s = calculate_bimodality_score(&info(0.0, 100.0, 80.0, 500));
        assert_eq!(s.dip_score, 1.0);
        assert_eq!(s.bic_score, 1.0);
        // |0.8 - 0.2| / 0.1 = 6 -> clamped to 1.
        assert!((s.mean_separation - 6.0).abs() < 1e-9);
        assert_eq!(s.mean_score, 1.0);
        assert!((s.score - 1.0).abs() < 1e-12);
        assert!((s.bic_diff - 20.0).abs() < 1e-12);
    }

    #[test]
    fn geometric_mean_is_not_arithmetic() {
        // dip 0.5, bic 1, mean 1 -> cbrt(0.5)
        let s = calculate_bimodality_score(&info(0.025, 100.0, 80.0, 100));
        assert!((s.dip_score - 0.5).abs() < 1e-12);
        assert!((s.score - 0.5f64.cbrt()).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_is_floored() {
        let mut i = info(0.0, 100.0, 80.0, 100);
        i.gmm_components = vec![
            GmmComponent::new(0.0, 0.0, 0.5),
            GmmComponent::new(0.01, 0.0, 0.5),
        ];
        // sigma = 0.01 each -> d = 1
        assert!((mean_separation(&i) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_bic_is_zero() {
        assert_eq!(bic_score(0.0, -10.0), 0.0);
        assert_eq!(bic_score(f64::NAN, 1.0), 0.0);
        assert_eq!(bic_score(100.0, 120.0), 0.0);
    }

    #[test]
    fn missing_components_zero_mean_score() {
        let mut i = info(0.0, 100.0, 80.0, 100);
        i.gmm_components.truncate(1);
        let s = calculate_bimodality_score(&i);
        assert_eq!(s.mean_score, 0.0);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn multimodality_averages_arithmetically() {
        let categories = vec![
            CategoryBimodality {
                category: "a".into(),
                bimodality: info(0.0, 100.0, 80.0, 100),
            },
            CategoryBimodality {
                category: "b".into(),
                bimodality: info(0.0, 100.0, 80.0, 5),
            },
        ];
        let m = calculate_multimodality_score(&categories);
        assert!((m.score - 0.5).abs() < 1e-12);
        assert_eq!(m.categories.len(), 2);
        assert_eq!(calculate_multimodality_score(&[]).score, 0.0);
    }

    #[test]
    fn score_serializes_every_part() {
        let s = calculate_bimodality_score(&info(0.0, 100.0, 80.0, 500));
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["score"], serde_json::json!(s.score));
        assert_eq!(json["dip_score"], serde_json::json!(1.0));
        assert_eq!(json["bic_diff"], serde_json::json!(s.bic_diff));
        assert_eq!(json.as_object().map(|o| o.len()), Some(6));
        let back: BimodalityScore = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
