#![forbid(unsafe_code)]

//! Node and link specifications consumed by the layout engine.
//!
//! [`NodeSpec`] is the immutable input description of one node of a feature
//! split tree. The layout engine never mutates it; positioned output lives in
//! separate types joined back by id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::keys::FeatureId;

/// Which analysis produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Root,
    FeatureSplitting,
    SemanticSimilarity,
    DecoderSimilarity,
    QualityScore,
    CauseAnalysis,
    #[serde(other)]
    Other,
}

/// Branch of a boolean (single-threshold) split.
///
/// Set when the tree is built so that ordering never has to inspect ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchIndex {
    /// Below the threshold.
    False = 0,
    /// At or above the threshold.
    True = 1,
}

impl BranchIndex {
    #[must_use]
    pub const fn from_bucket(bucket: usize) -> Self {
        if bucket == 0 { Self::False } else { Self::True }
    }
}

/// How a node is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A plain block.
    #[default]
    Standard,
    /// A stack of per-feature strips; widened after layout.
    VerticalBar,
    /// Stand-in for a stage that has not been configured yet.
    Placeholder,
}

/// Input description of one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub id: String,
    pub parent_id: Option<String>,
    /// Column the node is drawn in.
    pub stage: u32,
    /// Depth in the split tree. Usually equal to `stage`, except for
    /// terminal nodes pushed to the last column.
    pub depth: u32,
    pub category: Category,
    /// Metric whose thresholds produced this node's children.
    pub metric: Option<String>,
    pub feature_ids: BTreeSet<FeatureId>,
    pub feature_count: usize,
    /// Cut points producing the children; length is `children - 1`.
    pub thresholds: Vec<f64>,
    pub branch: Option<BranchIndex>,
    pub kind: NodeKind,
    pub color: Option<String>,
    pub name: Option<String>,
}

impl NodeSpec {
    /// Create a node with the given id at stage/depth 0.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Place the node at a stage; depth follows unless set afterwards.
    #[must_use]
    pub fn with_stage(mut self, stage: u32) -> Self {
        self.stage = stage;
        self.depth = stage;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    /// Set the feature set; also updates `feature_count`.
    #[must_use]
    pub fn with_features(mut self, ids: impl IntoIterator<Item = FeatureId>) -> Self {
        self.feature_ids = ids.into_iter().collect();
        self.feature_count = self.feature_ids.len();
        self
    }

    /// Set a feature count without ids (aggregate payloads).
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.feature_count = count;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: BranchIndex) -> Self {
        self.branch = Some(branch);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Display label; falls back to the id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A link endpoint given either as an index into the node list or as a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Index(usize),
    Id(String),
}

impl From<usize> for NodeRef {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for NodeRef {
    fn from(s: &str) -> Self {
        Self::Id(s.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(s: String) -> Self {
        Self::Id(s)
    }
}

/// Input description of one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source: NodeRef,
    pub target: NodeRef,
    /// Number of features flowing from source to target.
    pub value: f64,
}

impl LinkSpec {
    #[must_use]
    pub fn new(source: impl Into<NodeRef>, target: impl Into<NodeRef>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

/// `{ nodes, links }` dataset describing one Sankey panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SankeyDataset {
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
}

impl SankeyDataset {
    #[must_use]
    pub fn new(nodes: Vec<NodeSpec>, links: Vec<LinkSpec>) -> Self {
        Self { nodes, links }
    }

    /// Position of the node with `id` in `nodes`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ref_accepts_index_or_id() {
        let links: Vec<LinkSpec> = serde_json::from_str(
            r#"[{"source": 0, "target": "child", "value": 3}]"#,
        )
        .unwrap();
        assert_eq!(links[0].source, NodeRef::Index(0));
        assert_eq!(links[0].target, NodeRef::Id("child".into()));
    }

    #[test]
    fn unknown_category_maps_to_other() {
        let node: NodeSpec =
            serde_json::from_str(r#"{"id": "n", "category": "brand-new-stage"}"#).unwrap();
        assert_eq!(node.category, Category::Other);
        assert_eq!(node.kind, NodeKind::Standard);
    }

    #[test]
    fn with_features_sets_count() {
        let node = NodeSpec::new("a").with_features([3, 1, 3]);
        assert_eq!(node.feature_count, 2);
        assert!(node.is_root());
    }

    #[test]
    fn branch_from_bucket() {
        assert_eq!(BranchIndex::from_bucket(0), BranchIndex::False);
        assert_eq!(BranchIndex::from_bucket(1), BranchIndex::True);
    }
}
