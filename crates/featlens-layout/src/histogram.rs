#![forbid(unsafe_code)]

//! Histogram chart geometry.
//!
//! The x scale spans `[statistics.min, statistics.max]` (or a caller-fixed
//! domain, used to put score metrics on a shared 0..1 axis); the y scale spans
//! `[0, max(counts)]` with pixel y growing downward. Bars are clamped to the
//! plot area.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `statistics` missing | `Err(InvalidHistogram)` |
//! | edges/counts mismatch or edges not increasing | `tracing::warn!`, `Err(InvalidHistogram)` |
//! | all counts zero | y domain `[0, 1]`, bars have zero height |

use featlens_core::{Histogram, HistogramPayload, Rect, Sides, Size};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::scale::{LinearScale, format_tick};

/// Histogram chart parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Space for axes around the plot.
    pub margin: Sides,
    /// Target number of ticks per axis; grid lines follow the y ticks.
    pub tick_count: usize,
    /// Horizontal gap between adjacent bars.
    pub bar_padding: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            margin: Sides::new(10.0, 10.0, 30.0, 40.0),
            tick_count: 5,
            bar_padding: 1.0,
        }
    }
}

impl HistogramConfig {
    #[must_use]
    pub fn margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    #[must_use]
    pub fn tick_count(mut self, count: usize) -> Self {
        self.tick_count = count;
        self
    }

    #[must_use]
    pub fn bar_padding(mut self, padding: f64) -> Self {
        self.bar_padding = padding;
        self
    }
}

/// One bin drawn as a rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBar {
    pub index: usize,
    /// Bin edges in data units.
    pub x0: f64,
    pub x1: f64,
    pub count: u64,
    pub rect: Rect,
}

/// An axis tick at `position` pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub value: f64,
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramChart {
    pub size: Size,
    pub plot: Rect,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub bars: Vec<HistogramBar>,
    /// Horizontal grid line y positions.
    pub grid_lines: Vec<f64>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
}

impl HistogramChart {
    /// Bar under pixel `x`, if any.
    #[must_use]
    pub fn bar_at(&self, x: f64) -> Option<&HistogramBar> {
        self.bars
            .iter()
            .find(|b| x >= b.rect.left() && x < b.rect.right())
    }
}

/// Chart over `[statistics.min, statistics.max]`.
pub fn create_histogram_chart(
    payload: &HistogramPayload,
    width: f64,
    height: f64,
    config: &HistogramConfig,
) -> Result<HistogramChart> {
    let stats = payload
        .statistics
        .ok_or_else(|| LayoutError::histogram(format!("{}: missing statistics", payload.metric)))?;
    build_chart(payload, (stats.min, stats.max), width, height, config)
}

/// Chart over a caller-fixed x domain.
pub fn create_histogram_chart_with_domain(
    payload: &HistogramPayload,
    domain: (f64, f64),
    width: f64,
    height: f64,
    config: &HistogramConfig,
) -> Result<HistogramChart> {
    build_chart(payload, domain, width, height, config)
}

fn build_chart(
    payload: &HistogramPayload,
    domain: (f64, f64),
    width: f64,
    height: f64,
    config: &HistogramConfig,
) -> Result<HistogramChart> {
    let hist = &payload.histogram;
    if !hist.is_well_formed() {
        tracing::warn!(
            metric = %payload.metric,
            edges = hist.bin_edges.len(),
            counts = hist.counts.len(),
            "histogram.malformed"
        );
        return Err(LayoutError::histogram(format!(
            "{}: {} bin edges for {} counts",
            payload.metric,
            hist.bin_edges.len(),
            hist.counts.len()
        )));
    }

    let size = Size::new(width, height);
    let plot = Rect::from_size(width, height).inner(config.margin);
    let x_scale = LinearScale::new(domain, (plot.left(), plot.right())).with_clamp(true);
    let max_count = hist.max_count().max(1) as f64;
    let y_scale = LinearScale::new((0.0, max_count), (plot.bottom(), plot.top()));

    let bars = (0..hist.bin_count())
        .filter_map(|i| {
            let (x0, x1) = hist.bin_range(i)?;
            let count = hist.counts[i];
            let left = x_scale.scale(x0);
            let right = x_scale.scale(x1);
            let top = y_scale.scale(count as f64);
            Some(HistogramBar {
                index: i,
                x0,
                x1,
                count,
                rect: Rect::new(
                    left,
                    top,
                    (right - left - config.bar_padding).max(0.0),
                    plot.bottom() - top,
                ),
            })
        })
        .collect();

    let x_step = x_scale.tick_step(config.tick_count);
    let x_ticks = x_scale
        .ticks(config.tick_count)
        .into_iter()
        .map(|value| Tick {
            value,
            position: x_scale.scale(value),
            label: format_tick(value, x_step),
        })
        .collect();
    let y_step = y_scale.tick_step(config.tick_count);
    let y_ticks: Vec<Tick> = y_scale
        .ticks(config.tick_count)
        .into_iter()
        .map(|value| Tick {
            value,
            position: y_scale.scale(value),
            label: format_tick(value, y_step),
        })
        .collect();
    let grid_lines = y_ticks.iter().map(|t| t.position).collect();

    tracing::debug!(
        metric = %payload.metric,
        bins = hist.bin_count(),
        width,
        height,
        "histogram.chart"
    );

    Ok(HistogramChart {
        size,
        plot,
        x_scale,
        y_scale,
        bars,
        grid_lines,
        x_ticks,
        y_ticks,
    })
}

// ============================================================================
// Percentiles
// ============================================================================

/// Value below which `percentile` (0..=1) of the samples fall, assuming
/// samples spread uniformly inside each bin.
#[must_use]
pub fn percentile_to_threshold(hist: &Histogram, percentile: f64) -> Option<f64> {
    if !hist.is_well_formed() || hist.bin_count() == 0 {
        return None;
    }
    let p = percentile.clamp(0.0, 1.0);
    let first = hist.bin_edges[0];
    let last = hist.bin_edges[hist.bin_count()];
    let total = hist.total() as f64;
    if total == 0.0 {
        return Some(first + p * (last - first));
    }

    let target = p * total;
    let mut seen = 0.0;
    for (i, &count) in hist.counts.iter().enumerate() {
        let count = count as f64;
        if count > 0.0 && seen + count >= target {
            let (x0, x1) = hist.bin_range(i)?;
            let frac = ((target - seen) / count).clamp(0.0, 1.0);
            return Some(x0 + frac * (x1 - x0));
        }
        seen += count;
    }
    Some(last)
}

/// Fraction of samples below `threshold`, the inverse of
/// [`percentile_to_threshold`].
#[must_use]
pub fn threshold_to_percentile(hist: &Histogram, threshold: f64) -> Option<f64> {
    if !hist.is_well_formed() || hist.bin_count() == 0 {
        return None;
    }
    let first = hist.bin_edges[0];
    let last = hist.bin_edges[hist.bin_count()];
    let total = hist.total() as f64;
    if total == 0.0 {
        return Some(((threshold - first) / (last - first)).clamp(0.0, 1.0));
    }

    let mut below = 0.0;
    for (i, &count) in hist.counts.iter().enumerate() {
        let (x0, x1) = hist.bin_range(i)?;
        if threshold >= x1 {
            below += count as f64;
        } else if threshold > x0 {
            below += count as f64 * (threshold - x0) / (x1 - x0);
        }
    }
    Some((below / total).clamp(0.0, 1.0))
}
