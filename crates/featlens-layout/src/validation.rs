#![forbid(unsafe_code)]

//! Pre-layout checks that report problems instead of failing.
//!
//! Each function returns every problem it finds as a human-readable line.
//! An empty list means the input is safe to lay out.

use featlens_core::{HistogramPayload, NodeRef, SankeyDataset};
use rustc_hash::FxHashSet;

/// Smallest container a chart is drawn in.
pub const MIN_WIDTH: f64 = 200.0;
pub const MIN_HEIGHT: f64 = 250.0;

#[must_use]
pub fn validate_dimensions(width: f64, height: f64) -> Vec<String> {
    let mut errors = Vec::new();
    if !(width >= MIN_WIDTH) {
        errors.push(format!("width {width} is below the minimum of {MIN_WIDTH}"));
    }
    if !(height >= MIN_HEIGHT) {
        errors.push(format!(
            "height {height} is below the minimum of {MIN_HEIGHT}"
        ));
    }
    errors
}

#[must_use]
pub fn validate_histogram_data(payload: &HistogramPayload) -> Vec<String> {
    let mut errors = Vec::new();
    let hist = &payload.histogram;
    if hist.counts.is_empty() {
        errors.push(format!("{}: histogram has no bins", payload.metric));
    }
    if hist.bin_edges.len() != hist.counts.len() + 1 {
        errors.push(format!(
            "{}: expected {} bin edges, found {}",
            payload.metric,
            hist.counts.len() + 1,
            hist.bin_edges.len()
        ));
    }
    if hist.bin_edges.iter().any(|e| !e.is_finite()) {
        errors.push(format!("{}: bin edges must be finite", payload.metric));
    } else if hist.bin_edges.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(format!(
            "{}: bin edges must be strictly increasing",
            payload.metric
        ));
    }
    match payload.statistics {
        None => errors.push(format!("{}: missing statistics", payload.metric)),
        Some(stats) if !(stats.min <= stats.max) => errors.push(format!(
            "{}: statistics min {} exceeds max {}",
            payload.metric, stats.min, stats.max
        )),
        Some(_) => {}
    }
    errors
}

/// Structural problems in a layout input: no nodes, duplicate ids, and
/// links whose endpoints do not resolve. Dangling links are tolerated by
/// layout but still reported here.
#[must_use]
pub fn validate_sankey_data(data: &SankeyDataset) -> Vec<String> {
    let mut errors = Vec::new();
    if data.nodes.is_empty() {
        errors.push("dataset has no nodes".to_string());
    }
    let mut ids = FxHashSet::default();
    for node in &data.nodes {
        if !ids.insert(node.id.as_str()) {
            errors.push(format!("duplicate node id {}", node.id));
        }
    }
    let resolves = |r: &NodeRef| match r {
        NodeRef::Index(i) => *i < data.nodes.len(),
        NodeRef::Id(id) => ids.contains(id.as_str()),
    };
    for (i, link) in data.links.iter().enumerate() {
        for (end, r) in [("source", &link.source), ("target", &link.target)] {
            if !resolves(r) {
                errors.push(format!("link {i}: {end} {r:?} does not match any node"));
            }
        }
        if !(link.value >= 0.0) {
            errors.push(format!("link {i}: value {} is negative", link.value));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use featlens_core::{Histogram, HistogramStatistics, LinkSpec, NodeSpec};

    #[test]
    fn dimensions() {
        assert!(validate_dimensions(200.0, 250.0).is_empty());
        assert_eq!(validate_dimensions(199.0, 250.0).len(), 1);
        assert_eq!(validate_dimensions(100.0, 100.0).len(), 2);
        assert_eq!(validate_dimensions(f64::NAN, 300.0).len(), 1);
    }

    #[test]
    fn histogram_problems_are_listed() {
        let ok = HistogramPayload {
            metric: "m".into(),
            histogram: Histogram::new(vec![0.0, 0.5, 1.0], vec![1, 2]),
            statistics: Some(HistogramStatistics {
                min: 0.0,
                max: 1.0,
                mean: 0.6,
                sample_size: 3,
            }),
            ..HistogramPayload::default()
        };
        assert!(validate_histogram_data(&ok).is_empty());

        let mut bad = ok.clone();
        bad.statistics = None;
        bad.histogram.bin_edges = vec![0.0, 1.0, 0.5, 2.0];
        let errors = validate_histogram_data(&bad);
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("missing statistics")));
    }

    #[test]
    fn sankey_problems_are_listed() {
        let data = SankeyDataset::new(
            vec![NodeSpec::new("a"), NodeSpec::new("a"), NodeSpec::new("b")],
            vec![
                LinkSpec::new("a", "b", 1.0),
                LinkSpec::new("a", "zz", 1.0),
                LinkSpec::new(7usize, 2usize, -1.0),
            ],
        );
        let errors = validate_sankey_data(&data);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(validate_sankey_data(&SankeyDataset::default())
            .iter()
            .any(|e| e.contains("no nodes")));
    }
}
