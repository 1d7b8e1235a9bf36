#![forbid(unsafe_code)]

//! Feature split tree.
//!
//! [`FeatureTree`] is an arena over [`NodeSpec`]s linked by `parent_id`.
//! Splitting a node by thresholds on a metric replaces its subtree with
//! `thresholds.len() + 1` children that partition the node's feature set.
//!
//! # Invariants
//!
//! 1. Exactly one root.
//! 2. A node's `feature_ids` is the disjoint union of its children's.
//! 3. `thresholds` are finite and strictly increasing, and a node with
//!    thresholds has exactly `thresholds.len() + 1` children.
//! 4. Every `parent_id` resolves; there are no cycles.
//!
//! [`validate`](FeatureTree::validate) reports every violated invariant as a
//! readable string instead of failing on the first one.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::keys::FeatureId;
use crate::node::{BranchIndex, Category, LinkSpec, NodeSpec, SankeyDataset};

/// Arena tree of feature split nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<NodeSpec>", into = "Vec<NodeSpec>")]
pub struct FeatureTree {
    nodes: Vec<NodeSpec>,
    index: FxHashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

impl From<Vec<NodeSpec>> for FeatureTree {
    fn from(nodes: Vec<NodeSpec>) -> Self {
        let mut tree = Self {
            nodes,
            index: FxHashMap::default(),
            children: Vec::new(),
        };
        tree.reindex();
        tree
    }
}

impl From<FeatureTree> for Vec<NodeSpec> {
    fn from(tree: FeatureTree) -> Self {
        tree.nodes
    }
}

impl FeatureTree {
    /// Create a tree holding only `root`.
    #[must_use]
    pub fn with_root(mut root: NodeSpec) -> Self {
        root.parent_id = None;
        root.category = Category::Root;
        Self::from(vec![root])
    }

    /// Build a tree from a flat node list.
    ///
    /// Fails on duplicate ids or unresolvable parents. Semantic invariants
    /// (disjointness, thresholds) are checked by [`validate`](Self::validate).
    pub fn from_nodes(nodes: Vec<NodeSpec>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for node in &nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(CoreError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }
        for node in &nodes {
            if let Some(parent) = &node.parent_id
                && !seen.contains(parent.as_str())
            {
                return Err(CoreError::not_found(parent.clone()));
            }
        }
        Ok(Self::from(nodes))
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.children = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent_id.as_ref().and_then(|p| self.index.get(p)) {
                self.children[*parent].push(i);
            }
        }
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeSpec> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// The first parentless node.
    #[must_use]
    pub fn root(&self) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.is_root())
    }

    /// Children of `id` in insertion order.
    #[must_use]
    pub fn children(&self, id: &str) -> Vec<&NodeSpec> {
        self.index
            .get(id)
            .map(|&i| self.children[i].iter().map(|&c| &self.nodes[c]).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self, id: &str) -> Option<&NodeSpec> {
        self.get(id)?.parent_id.as_deref().and_then(|p| self.get(p))
    }

    /// Ancestors of `id`, nearest first. Stops on a cycle.
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<&NodeSpec> {
        let mut out = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = self.parent(id);
        while let Some(node) = current {
            if !visited.insert(node.id.as_str()) {
                break;
            }
            out.push(node);
            current = self.parent(&node.id);
        }
        out
    }

    /// Nodes without children.
    pub fn leaves(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.children[*i].is_empty())
            .map(|(_, n)| n)
    }

    /// Ids of `id` and all its descendants, pre-order.
    #[must_use]
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![start];
        let mut visited = FxHashSet::default();
        while let Some(i) = stack.pop() {
            if !visited.insert(i) {
                continue;
            }
            out.push(self.nodes[i].id.clone());
            stack.extend(self.children[i].iter().rev());
        }
        out
    }

    // ====================================================================
    // Validation
    // ====================================================================

    /// Every violated invariant, as human-readable strings. Empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let roots = self.nodes.iter().filter(|n| n.is_root()).count();
        if roots != 1 {
            errors.push(format!("expected exactly one root, found {roots}"));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = &node.parent_id
                && !self.index.contains_key(parent)
            {
                errors.push(format!("node {} references missing parent {parent}", node.id));
            }
            if self.ancestors(&node.id).iter().any(|a| a.id == node.id) {
                errors.push(format!("node {} is part of a cycle", node.id));
            }
            if !node.feature_ids.is_empty() && node.feature_ids.len() != node.feature_count {
                errors.push(format!(
                    "node {} has feature_count {} but {} feature ids",
                    node.id,
                    node.feature_count,
                    node.feature_ids.len()
                ));
            }
            if !thresholds_valid(&node.thresholds) {
                errors.push(format!(
                    "node {} thresholds are not strictly increasing: {:?}",
                    node.id, node.thresholds
                ));
            }

            let children = &self.children[i];
            if children.is_empty() {
                continue;
            }
            if !node.thresholds.is_empty() && children.len() != node.thresholds.len() + 1 {
                errors.push(format!(
                    "node {} has {} thresholds but {} children",
                    node.id,
                    node.thresholds.len(),
                    children.len()
                ));
            }

            let child_count: usize = children.iter().map(|&c| self.nodes[c].feature_count).sum();
            if child_count != node.feature_count {
                errors.push(format!(
                    "children of {} hold {child_count} features, parent holds {}",
                    node.id, node.feature_count
                ));
            }

            if node.feature_ids.is_empty() {
                continue;
            }
            let mut union = BTreeSet::new();
            for &c in children {
                for id in &self.nodes[c].feature_ids {
                    if !union.insert(*id) {
                        errors.push(format!(
                            "feature {id} appears in more than one child of {}",
                            node.id
                        ));
                    }
                }
            }
            if union != node.feature_ids {
                errors.push(format!(
                    "children of {} do not cover exactly the parent's features",
                    node.id
                ));
            }
        }
        errors
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn ensure_valid(&self) -> Result<()> {
        let violations = self.validate();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidTree { violations })
        }
    }

    // ====================================================================
    // Mutation
    // ====================================================================

    /// Split `id` by `thresholds` on `metric`, replacing any existing subtree.
    ///
    /// Bucket `k` holds features whose score `s` satisfies
    /// `thresholds[k-1] <= s < thresholds[k]`. Features without a score land
    /// in bucket 0. Returns the new child ids.
    pub fn split_node(
        &mut self,
        id: &str,
        metric: &str,
        thresholds: &[f64],
        category: Category,
        scores: &FxHashMap<FeatureId, f64>,
    ) -> Result<Vec<String>> {
        if !thresholds_valid(thresholds) {
            return Err(CoreError::InvalidThresholds {
                thresholds: thresholds.to_vec(),
            });
        }
        let parent = self.get(id).cloned().ok_or_else(|| CoreError::not_found(id))?;

        let mut buckets = vec![BTreeSet::new(); thresholds.len() + 1];
        for feature in &parent.feature_ids {
            let bucket = scores
                .get(feature)
                .map_or(0, |&s| bucket_index(s, thresholds));
            buckets[bucket].insert(*feature);
        }

        self.remove_descendants(id);
        if let Some(&i) = self.index.get(id) {
            let node = &mut self.nodes[i];
            node.metric = Some(metric.to_string());
            node.thresholds = thresholds.to_vec();
        }

        let boolean = thresholds.len() == 1;
        let mut child_ids = Vec::with_capacity(buckets.len());
        for (bucket, features) in buckets.into_iter().enumerate() {
            let mut child = NodeSpec::new(format!("{id}_{bucket}"))
                .with_parent(id)
                .with_stage(parent.stage + 1)
                .with_depth(parent.depth + 1)
                .with_category(category)
                .with_features(features);
            if boolean {
                child = child.with_branch(BranchIndex::from_bucket(bucket));
            }
            child_ids.push(child.id.clone());
            self.nodes.push(child);
        }
        self.reindex();

        tracing::debug!(
            node = id,
            metric,
            children = child_ids.len(),
            "feature_tree.split"
        );
        Ok(child_ids)
    }

    /// Re-split `id` with new thresholds on its existing metric.
    pub fn set_thresholds(
        &mut self,
        id: &str,
        thresholds: &[f64],
        scores: &FxHashMap<FeatureId, f64>,
    ) -> Result<Vec<String>> {
        let node = self.get(id).ok_or_else(|| CoreError::not_found(id))?;
        let metric = node.metric.clone().unwrap_or_default();
        let category = self
            .children(id)
            .first()
            .map_or(Category::Other, |c| c.category);
        self.split_node(id, &metric, thresholds, category, scores)
    }

    /// Remove every descendant of `id`, keeping `id` itself.
    pub fn remove_descendants(&mut self, id: &str) {
        let doomed: FxHashSet<String> = self.subtree_ids(id).into_iter().skip(1).collect();
        if doomed.is_empty() {
            return;
        }
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.reindex();
    }

    /// Mutable access for color assignment and similar passes.
    pub(crate) fn nodes_mut(&mut self) -> &mut [NodeSpec] {
        &mut self.nodes
    }

    pub(crate) fn child_indices(&self, i: usize) -> &[usize] {
        &self.children[i]
    }

    // ====================================================================
    // Export
    // ====================================================================

    /// Flatten into the `{nodes, links}` layout input. Link value is the
    /// child's feature count.
    #[must_use]
    pub fn to_dataset(&self) -> SankeyDataset {
        let links = self
            .nodes
            .iter()
            .filter_map(|n| {
                let parent = n.parent_id.as_ref()?;
                Some(LinkSpec::new(
                    parent.clone(),
                    n.id.clone(),
                    n.feature_count as f64,
                ))
            })
            .collect();
        SankeyDataset::new(self.nodes.clone(), links)
    }
}

/// Finite and strictly increasing.
#[must_use]
pub fn thresholds_valid(thresholds: &[f64]) -> bool {
    thresholds.iter().all(|t| t.is_finite()) && thresholds.windows(2).all(|w| w[0] < w[1])
}

/// Number of thresholds at or below `value`.
#[must_use]
pub fn bucket_index(value: f64, thresholds: &[f64]) -> usize {
    thresholds.iter().take_while(|&&t| value >= t).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(FeatureId, f64)]) -> FxHashMap<FeatureId, f64> {
        pairs.iter().copied().collect()
    }

    fn root() -> FeatureTree {
        FeatureTree::with_root(NodeSpec::new("root").with_features(1..=6))
    }

    #[test]
    fn split_partitions_parent_features() {
        let mut tree = root();
        let s = scores(&[(1, 0.1), (2, 0.4), (3, 0.5), (4, 0.9), (5, 0.7)]);
        let ids = tree
            .split_node("root", "decoder_sim", &[0.3, 0.7], Category::DecoderSimilarity, &s)
            .unwrap();
        assert_eq!(ids, vec!["root_0", "root_1", "root_2"]);
        let counts: Vec<_> = tree
            .children("root")
            .iter()
            .map(|c| c.feature_ids.iter().copied().collect::<Vec<_>>())
            .collect();
        // Feature 6 has no score and falls into bucket 0.
        assert_eq!(counts, vec![vec![1, 6], vec![2, 3], vec![4, 5]]);
        assert!(tree.validate().is_empty(), "{:?}", tree.validate());
    }

    #[test]
    fn boolean_split_stamps_branches() {
        let mut tree = root();
        tree.split_node("root", "m", &[0.5], Category::FeatureSplitting, &scores(&[]))
            .unwrap();
        let branches: Vec<_> = tree.children("root").iter().map(|c| c.branch).collect();
        assert_eq!(
            branches,
            vec![Some(BranchIndex::False), Some(BranchIndex::True)]
        );
    }

    #[test]
    fn resplit_replaces_subtree() {
        let mut tree = root();
        tree.split_node("root", "m", &[0.5], Category::FeatureSplitting, &scores(&[]))
            .unwrap();
        tree.split_node("root_0", "q", &[0.2], Category::QualityScore, &scores(&[]))
            .unwrap();
        assert_eq!(tree.len(), 5);
        tree.set_thresholds("root", &[0.2, 0.8], &scores(&[])).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree.get("root_0_0").is_none());
        assert_eq!(tree.children("root")[0].category, Category::FeatureSplitting);
    }

    #[test]
    fn invalid_thresholds_rejected() {
        let mut tree = root();
        let err = tree
            .split_node("root", "m", &[0.5, 0.5], Category::Other, &scores(&[]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidThresholds { .. }));
        assert!(tree.split_node("nope", "m", &[], Category::Other, &scores(&[])).is_err());
    }

    #[test]
    fn validate_reports_overlap_and_roots() {
        let nodes = vec![
            NodeSpec::new("a").with_features([1, 2]),
            NodeSpec::new("b").with_parent("a").with_features([1]),
            NodeSpec::new("c").with_parent("a").with_features([1]),
            NodeSpec::new("d").with_features([9]),
        ];
        let tree = FeatureTree::from_nodes(nodes).unwrap();
        let errors = tree.validate();
        assert!(errors.iter().any(|e| e.contains("exactly one root")));
        assert!(errors.iter().any(|e| e.contains("more than one child")));
        assert!(tree.ensure_valid().is_err());
    }

    #[test]
    fn from_nodes_rejects_duplicates_and_dangling_parents() {
        let dup = vec![NodeSpec::new("a"), NodeSpec::new("a")];
        assert!(matches!(
            FeatureTree::from_nodes(dup),
            Err(CoreError::DuplicateNode { .. })
        ));
        let dangling = vec![NodeSpec::new("a"), NodeSpec::new("b").with_parent("zz")];
        assert!(matches!(
            FeatureTree::from_nodes(dangling),
            Err(CoreError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn dataset_links_carry_child_counts() {
        let mut tree = root();
        let s = scores(&[(1, 0.9), (2, 0.9)]);
        tree.split_node("root", "m", &[0.5], Category::FeatureSplitting, &s)
            .unwrap();
        let data = tree.to_dataset();
        assert_eq!(data.links.len(), 2);
        let values: Vec<f64> = data.links.iter().map(|l| l.value).collect();
        assert_eq!(values, vec![4.0, 2.0]);
    }

    #[test]
    fn bucket_index_is_inclusive_at_threshold() {
        assert_eq!(bucket_index(0.3, &[0.3, 0.7]), 1);
        assert_eq!(bucket_index(0.29, &[0.3, 0.7]), 0);
        assert_eq!(bucket_index(0.7, &[0.3, 0.7]), 2);
    }
}
