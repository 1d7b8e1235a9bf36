#![forbid(unsafe_code)]

//! Histogram payloads as delivered by the backend, one per (metric, node).

use serde::{Deserialize, Serialize};

/// Bin edges and counts. `bin_edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    #[must_use]
    pub fn new(bin_edges: Vec<f64>, counts: Vec<u64>) -> Self {
        Self { bin_edges, counts }
    }

    /// Number of bins.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// `[x0, x1]` of bin `i`, if both edges exist.
    #[must_use]
    pub fn bin_range(&self, i: usize) -> Option<(f64, f64)> {
        let x0 = *self.bin_edges.get(i)?;
        let x1 = *self.bin_edges.get(i + 1)?;
        Some((x0, x1))
    }

    #[must_use]
    pub fn bin_center(&self, i: usize) -> Option<f64> {
        self.bin_range(i).map(|(x0, x1)| (x0 + x1) / 2.0)
    }

    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Whether edges and counts agree in length and edges strictly increase.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.bin_edges.len() == self.counts.len() + 1
            && self.bin_edges.iter().all(|e| e.is_finite())
            && self.bin_edges.windows(2).all(|w| w[0] < w[1])
    }
}

/// Summary statistics of the underlying sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HistogramStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    #[serde(default)]
    pub sample_size: usize,
}

/// One component of a fitted Gaussian mixture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GmmComponent {
    pub mean: f64,
    pub variance: f64,
    #[serde(default)]
    pub weight: f64,
}

impl GmmComponent {
    #[must_use]
    pub const fn new(mean: f64, variance: f64, weight: f64) -> Self {
        Self {
            mean,
            variance,
            weight,
        }
    }
}

/// Distributional statistics computed by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BimodalityInfo {
    /// Hartigan dip test p-value.
    pub dip_pvalue: f64,
    /// BIC of a one-component mixture.
    pub bic_k1: f64,
    /// BIC of a two-component mixture.
    pub bic_k2: f64,
    #[serde(default)]
    pub gmm_components: Vec<GmmComponent>,
    pub sample_size: usize,
}

/// Bimodality statistics of one category of a multi-category metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryBimodality {
    pub category: String,
    pub bimodality: BimodalityInfo,
}

/// Full backend payload for one (metric, node).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistogramPayload {
    #[serde(default)]
    pub metric: String,
    pub histogram: Histogram,
    pub statistics: Option<HistogramStatistics>,
    #[serde(default)]
    pub bimodality: Option<BimodalityInfo>,
    #[serde(default)]
    pub multimodality: Vec<CategoryBimodality>,
    #[serde(default)]
    pub total_features: usize,
}
