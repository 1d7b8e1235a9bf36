#![forbid(unsafe_code)]

//! Hierarchical node colors.
//!
//! Stage-1 nodes take a categorical palette color by sibling position; every
//! deeper node derives its color from its parent's: the `True` branch of a
//! boolean split keeps the parent hue, the `False` branch and higher buckets
//! of a multi-way split are progressively mixed toward white.

use std::fmt;

use crate::node::BranchIndex;
use crate::tree::FeatureTree;

/// Root color.
pub const ROOT_COLOR: Rgb = Rgb::new(0x94, 0xa3, 0xb8);

/// Categorical palette for stage-1 subtrees.
pub const PALETTE: [Rgb; 8] = [
    Rgb::new(0x4e, 0x79, 0xa7),
    Rgb::new(0xf2, 0x8e, 0x2b),
    Rgb::new(0xe1, 0x57, 0x59),
    Rgb::new(0x76, 0xb7, 0xb2),
    Rgb::new(0x59, 0xa1, 0x4f),
    Rgb::new(0xed, 0xc9, 0x48),
    Rgb::new(0xb0, 0x7a, 0xa1),
    Rgb::new(0x9c, 0x75, 0x5f),
];

const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Linear mix toward `other`; `t = 0` keeps `self`.
    #[must_use]
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb::new(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Color of child `position` (0-based) out of `siblings`, given its parent color.
#[must_use]
pub fn child_color(
    parent: Rgb,
    parent_is_root: bool,
    position: usize,
    siblings: usize,
    branch: Option<BranchIndex>,
) -> Rgb {
    if parent_is_root {
        return PALETTE[position % PALETTE.len()];
    }
    match branch {
        Some(BranchIndex::True) => parent,
        Some(BranchIndex::False) => parent.mix(WHITE, 0.45),
        None if siblings <= 1 => parent,
        None => parent.mix(WHITE, 0.6 * position as f64 / (siblings - 1) as f64),
    }
}

impl FeatureTree {
    /// Assign `color` to every node, walking from the root.
    ///
    /// Nodes unreachable from a root keep their existing color.
    pub fn assign_colors(&mut self) {
        let roots: Vec<usize> = self
            .nodes()
            .enumerate()
            .filter(|(_, n)| n.is_root())
            .map(|(i, _)| i)
            .collect();

        let mut stack: Vec<(usize, Rgb, bool)> = Vec::new();
        for root in roots {
            self.nodes_mut()[root].color = Some(ROOT_COLOR.to_hex());
            stack.push((root, ROOT_COLOR, true));
        }

        let mut visited = vec![false; self.len()];
        while let Some((i, color, is_root)) = stack.pop() {
            if std::mem::replace(&mut visited[i], true) {
                continue;
            }
            let children = self.child_indices(i).to_vec();
            let siblings = children.len();
            for (position, c) in children.into_iter().enumerate() {
                let branch = self.nodes_mut()[c].branch;
                let child = child_color(color, is_root, position, siblings, branch);
                self.nodes_mut()[c].color = Some(child.to_hex());
                stack.push((c, child, false));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Category, NodeSpec};
    use rustc_hash::FxHashMap;

    #[test]
    fn hex_round_trip() {
        let c = Rgb::from_hex("#4e79a7").unwrap();
        assert_eq!(c, PALETTE[0]);
        assert_eq!(c.to_hex(), "#4e79a7");
        assert!(Rgb::from_hex("#12345").is_none());
        assert!(Rgb::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn mix_endpoints() {
        let c = Rgb::new(0, 100, 200);
        assert_eq!(c.mix(WHITE, 0.0), c);
        assert_eq!(c.mix(WHITE, 1.0), WHITE);
    }

    #[test]
    fn colors_follow_ancestor_chain() {
        let mut tree = FeatureTree::with_root(NodeSpec::new("root").with_features(1..=4));
        let none = FxHashMap::default();
        tree.split_node("root", "m", &[0.5], Category::FeatureSplitting, &none)
            .unwrap();
        tree.split_node("root_1", "q", &[0.5], Category::QualityScore, &none)
            .unwrap();
        tree.assign_colors();

        let color = |id: &str| tree.get(id).and_then(|n| n.color.clone()).unwrap();
        assert_eq!(color("root"), ROOT_COLOR.to_hex());
        assert_eq!(color("root_0"), PALETTE[0].to_hex());
        assert_eq!(color("root_1"), PALETTE[1].to_hex());
        // True branch keeps the parent hue; False is lighter.
        assert_eq!(color("root_1_1"), PALETTE[1].to_hex());
        assert_eq!(color("root_1_0"), PALETTE[1].mix(WHITE, 0.45).to_hex());
    }
}
