#![forbid(unsafe_code)]

//! Node ordering within a Sankey column.
//!
//! Ordering is the only thing keeping sibling flows grouped and non-crossing,
//! so the comparator is a strict total order built from these keys, in
//! priority order:
//!
//! 1. stage ascending
//! 2. stage-1 ancestor ("subtree anchor") ascending; the root has no
//!    anchor and sorts first
//! 3. depth descending, so nodes pulled forward from deeper in the same
//!    subtree sit above shallower ones
//! 4. parent ascending
//! 5. branch (`False` before `True`; unbranched nodes first)
//! 6. input index
//!
//! Keys 2 and 4 compare ancestors by their own [`Rank`] (branch, then
//! input index) rather than by raw input index, so a `False` subtree
//! precedes its `True` sibling at every level even when it appears later
//! in the input.

use std::cmp::Ordering;

use featlens_core::BranchIndex;
use serde::{Deserialize, Serialize};

/// Branch and input index of an ancestor.
pub type Rank = (Option<BranchIndex>, usize);

/// Sort keys of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub stage: u32,
    pub anchor: Option<Rank>,
    pub depth: u32,
    pub parent: Option<Rank>,
    pub branch: Option<BranchIndex>,
    pub input_index: usize,
}

/// Total order over [`OrderKey`]s.
#[must_use]
pub fn compare_nodes(a: &OrderKey, b: &OrderKey) -> Ordering {
    a.stage
        .cmp(&b.stage)
        .then_with(|| a.anchor.cmp(&b.anchor))
        .then_with(|| b.depth.cmp(&a.depth))
        .then_with(|| a.parent.cmp(&b.parent))
        .then_with(|| a.branch.cmp(&b.branch))
        .then_with(|| a.input_index.cmp(&b.input_index))
}

/// Compute order keys for `count` nodes from a parent lookup.
///
/// `parent_of(i)` returns the layout index of node `i`'s parent. Chains are
/// cut after `count` steps so a malformed parent relation cannot loop.
pub(crate) fn order_keys(
    count: usize,
    parent_of: impl Fn(usize) -> Option<usize>,
    attrs: impl Fn(usize) -> (u32, u32, Option<BranchIndex>, usize),
) -> Vec<OrderKey> {
    (0..count)
        .map(|i| {
            let mut chain = vec![i];
            let mut current = i;
            while let Some(p) = parent_of(current) {
                if chain.len() > count || chain.contains(&p) {
                    break;
                }
                chain.push(p);
                current = p;
            }
            let rank = |n: usize| {
                let (_, _, branch, input_index) = attrs(n);
                (branch, input_index)
            };
            let anchor = (chain.len() >= 2).then(|| rank(chain[chain.len() - 2]));
            let parent = parent_of(i).map(rank);
            let (stage, depth, branch, input_index) = attrs(i);
            OrderKey {
                stage,
                anchor,
                depth,
                parent,
                branch,
                input_index,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(stage: u32, anchor: Option<usize>, depth: u32, input_index: usize) -> OrderKey {
        let anchor = anchor.map(|a| (None, a));
        OrderKey {
            stage,
            anchor,
            depth,
            parent: anchor,
            branch: None,
            input_index,
        }
    }

    #[test]
    fn stage_dominates() {
        let a = key(0, Some(9), 0, 9);
        let b = key(1, None, 5, 0);
        assert_eq!(compare_nodes(&a, &b), Ordering::Less);
    }

    #[test]
    fn subtree_groups_before_depth() {
        let shallow_first_subtree = key(2, Some(1), 2, 7);
        let deep_second_subtree = key(2, Some(2), 5, 3);
        assert_eq!(
            compare_nodes(&shallow_first_subtree, &deep_second_subtree),
            Ordering::Less
        );
    }

    #[test]
    fn deeper_first_within_subtree() {
        let deep = key(3, Some(1), 4, 8);
        let shallow = key(3, Some(1), 3, 2);
        assert_eq!(compare_nodes(&deep, &shallow), Ordering::Less);
    }

    #[test]
    fn false_branch_before_true() {
        let mut t = key(1, Some(1), 1, 1);
        t.branch = Some(BranchIndex::True);
        let mut f = key(1, Some(1), 1, 2);
        f.branch = Some(BranchIndex::False);
        assert_eq!(compare_nodes(&f, &t), Ordering::Less);
    }

    #[test]
    fn keys_follow_parent_chain() {
        // 0 -> 1 -> 2, 0 -> 3
        let parents = [None, Some(0), Some(1), Some(0)];
        let keys = order_keys(
            4,
            |i| parents[i],
            |i| (i.min(2) as u32, i.min(2) as u32, None, i * 10),
        );
        assert_eq!(keys[0].anchor, None);
        assert_eq!(keys[1].anchor, Some((None, 10)));
        assert_eq!(keys[2].anchor, Some((None, 10)));
        assert_eq!(keys[3].anchor, Some((None, 30)));
        assert_eq!(keys[2].parent, Some((None, 10)));
    }

    #[test]
    fn false_subtree_precedes_true_subtree() {
        // root(0) -> true(1), false(2); each with one child (3 under 1, 4 under 2)
        let parents = [None, Some(0), Some(0), Some(1), Some(2)];
        let branches = [
            None,
            Some(BranchIndex::True),
            Some(BranchIndex::False),
            None,
            None,
        ];
        let stages = [0, 1, 1, 2, 2];
        let keys = order_keys(5, |i| parents[i], |i| (stages[i], stages[i], branches[i], i));
        assert_eq!(compare_nodes(&keys[2], &keys[1]), Ordering::Less);
        assert_eq!(compare_nodes(&keys[4], &keys[3]), Ordering::Less);
    }

    #[test]
    fn false_parent_wins_over_earlier_true_parent() {
        // root(0) -> a(1) -> true(2), false(3); children 4 under 2, 5 under 3.
        let parents = [None, Some(0), Some(1), Some(1), Some(2), Some(3)];
        let branches = [
            None,
            None,
            Some(BranchIndex::True),
            Some(BranchIndex::False),
            None,
            None,
        ];
        let stages = [0, 1, 2, 2, 3, 3];
        let keys = order_keys(6, |i| parents[i], |i| (stages[i], stages[i], branches[i], i));
        assert_eq!(keys[4].anchor, keys[5].anchor);
        assert_eq!(keys[5].parent, Some((Some(BranchIndex::False), 3)));
        assert_eq!(compare_nodes(&keys[5], &keys[4]), Ordering::Less);
    }

    #[test]
    fn cyclic_parents_terminate() {
        let parents = [Some(1), Some(0)];
        let keys = order_keys(2, |i| parents[i], |i| (0, 0, None, i));
        assert_eq!(keys.len(), 2);
    }
}
