//! Benchmarks for the Sankey solver and layout cache.
//!
//! Run with: cargo bench -p featlens-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use featlens_core::{Category, FeatureId, FeatureTree, NodeSpec, SankeyDataset};
use featlens_layout::{LayoutCache, SankeyConfig, apply_right_to_left_transform, calculate_sankey_layout};
use rustc_hash::FxHashMap;
use std::hint::black_box;

/// Split every leaf `levels` times into three buckets.
fn make_dataset(features: u32, levels: usize) -> SankeyDataset {
    let scores: FxHashMap<FeatureId, f64> = (0..features)
        .map(|i| (i, f64::from(i * 7919 % features) / f64::from(features)))
        .collect();
    let mut tree = FeatureTree::with_root(NodeSpec::new("root").with_features(0..features));
    for _ in 0..levels {
        let leaves: Vec<String> = tree.leaves().map(|n| n.id.clone()).collect();
        for leaf in leaves {
            tree.split_node(&leaf, "score", &[0.33, 0.66], Category::QualityScore, &scores)
                .expect("leaf exists");
        }
    }
    tree.to_dataset()
}

fn bench_sankey_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("sankey/layout");
    let cfg = SankeyConfig::default();
    for levels in [1, 2, 3, 4] {
        let data = make_dataset(2000, levels);
        group.bench_with_input(BenchmarkId::new("levels", levels), &data, |b, data| {
            b.iter(|| black_box(calculate_sankey_layout(data, 1200.0, 800.0, &cfg)))
        });
    }
    group.finish();
}

fn bench_mirror(c: &mut Criterion) {
    let data = make_dataset(2000, 3);
    let layout = calculate_sankey_layout(&data, 1200.0, 800.0, &SankeyConfig::default())
        .expect("valid tree");
    c.bench_function("sankey/mirror", |b| {
        b.iter(|| black_box(apply_right_to_left_transform(&layout)))
    });
}

fn bench_cache_hit(c: &mut Criterion) {
    let data = make_dataset(2000, 3);
    let cfg = SankeyConfig::default();
    let mut cache = LayoutCache::new(8);
    c.bench_function("sankey/cache_hit", |b| {
        b.iter(|| black_box(cache.layout(&data, 1200.0, 800.0, &cfg)))
    });
}

criterion_group!(benches, bench_sankey_layout, bench_mirror, bench_cache_hit);
criterion_main!(benches);
