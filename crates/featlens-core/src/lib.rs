#![forbid(unsafe_code)]

//! Core data model for featlens.
//!
//! # Role in featlens
//! `featlens-core` is the input layer. It owns the feature split tree, the
//! `{nodes, links}` dataset consumed by layout, backend histogram payloads,
//! structural keys for pairs/features/cache entries, and f64 pixel geometry.
//!
//! # How it fits in the system
//! `featlens-layout` turns a [`SankeyDataset`] or [`HistogramPayload`] into
//! pixel geometry; `featlens-score` derives bimodality scores from
//! [`BimodalityInfo`]; `featlens-tagging` keys its selection state by
//! [`ItemKey`].

pub mod color;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod keys;
pub mod node;
pub mod tree;

pub use error::{CoreError, Result};
pub use geometry::{Point, Rect, Sides, Size};
pub use histogram::{
    BimodalityInfo, CategoryBimodality, GmmComponent, Histogram, HistogramPayload,
    HistogramStatistics,
};
pub use keys::{FeatureId, HistogramKey, ItemKey, PairKey};
pub use node::{BranchIndex, Category, LinkSpec, NodeKind, NodeRef, NodeSpec, SankeyDataset};
pub use tree::{FeatureTree, bucket_index, thresholds_valid};
