#![forbid(unsafe_code)]

//! Threshold shading for histogram bins and slider tracks.
//!
//! A bin belongs to the region its centre falls in; a centre equal to a
//! threshold belongs to the region above it. Region `i` of `n` thresholds is
//! drawn with opacity `0.25 + 0.5 * i / n`.

use featlens_score::{ThresholdRegion, region_for_index, region_index, region_opacity};
use serde::{Deserialize, Serialize};

/// Region assignment of one histogram bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinShade {
    pub bin: usize,
    pub x0: f64,
    pub x1: f64,
    pub region_index: usize,
    pub region: ThresholdRegion,
    pub opacity: f64,
}

/// Shade every bin of `bin_edges` by `thresholds`.
#[must_use]
pub fn generate_histogram_shading(bin_edges: &[f64], thresholds: &[f64]) -> Vec<BinShade> {
    bin_edges
        .windows(2)
        .enumerate()
        .map(|(bin, edge)| {
            let centre = (edge[0] + edge[1]) / 2.0;
            let index = region_index(centre, thresholds);
            BinShade {
                bin,
                x0: edge[0],
                x1: edge[1],
                region_index: index,
                region: region_for_index(index, thresholds.len()),
                opacity: region_opacity(index, thresholds.len()),
            }
        })
        .collect()
}

/// One stop of a linear gradient, `offset` in `0..=1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

/// Hard-edged gradient that paints region `i` of `domain` with `colors[i]`.
///
/// Each threshold inside the domain contributes two stops at the same
/// offset. Colours are reused cyclically when there are fewer colours than
/// regions; no colours yields no stops.
#[must_use]
pub fn threshold_gradient_stops(
    domain: (f64, f64),
    thresholds: &[f64],
    colors: &[&str],
) -> Vec<GradientStop> {
    if colors.is_empty() {
        return Vec::new();
    }
    let (lo, hi) = domain;
    let span = hi - lo;
    let color = |i: usize| colors[i % colors.len()].to_string();
    let offset = |t: f64| {
        if span == 0.0 {
            0.0
        } else {
            ((t - lo) / span).clamp(0.0, 1.0)
        }
    };

    let mut stops = vec![GradientStop {
        offset: 0.0,
        color: color(0),
    }];
    for (i, &t) in thresholds.iter().enumerate() {
        let at = offset(t);
        stops.push(GradientStop {
            offset: at,
            color: color(i),
        });
        stops.push(GradientStop {
            offset: at,
            color: color(i + 1),
        });
    }
    stops.push(GradientStop {
        offset: 1.0,
        color: color(thresholds.len()),
    });
    stops
}
