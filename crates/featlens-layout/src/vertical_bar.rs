#![forbid(unsafe_code)]

//! Per-feature strips inside a vertical-bar Sankey node.
//!
//! A vertical-bar node is cut into one horizontal strip per feature, ordered
//! by a global ranking supplied by the caller (usually the order of the
//! comparison table). A scroll indicator marks the slice of strips that the
//! table currently shows.
//!
//! # Invariants
//!
//! 1. Strips tile the node exactly: strip `k` spans
//!    `[y0 + k*h, y0 + (k+1)*h]` with `h = height / n`.
//! 2. Features missing from the global order sort after ranked ones, by id.
//! 3. The indicator spans the first through last visible strip, including
//!    hidden strips in between, and is `None` when nothing is visible.

use featlens_core::{FeatureId, Rect};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::sankey::PositionedNode;

/// Selection state of the feature behind a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripState {
    Selected,
    Rejected,
    #[default]
    Unset,
}

/// Fill colour per [`StripState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripColors {
    pub selected: String,
    pub rejected: String,
    pub unset: String,
}

impl Default for StripColors {
    fn default() -> Self {
        Self {
            selected: "#22c55e".into(),
            rejected: "#ef4444".into(),
            unset: "#e5e7eb".into(),
        }
    }
}

impl StripColors {
    #[must_use]
    pub fn for_state(&self, state: StripState) -> &str {
        match state {
            StripState::Selected => &self.selected,
            StripState::Rejected => &self.rejected,
            StripState::Unset => &self.unset,
        }
    }
}

/// One feature's strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStrip {
    pub feature_id: FeatureId,
    pub rect: Rect,
    pub state: StripState,
    pub color: String,
}

/// Strips and scroll indicator for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalBarLayout {
    pub node_id: String,
    pub rect: Rect,
    pub strips: Vec<FeatureStrip>,
    pub scroll_indicator: Option<Rect>,
}

/// Split `node` into strips for `feature_ids`.
///
/// `global_order` ranks features; `state_of` colours each strip;
/// `visible_ids` is the set of features currently shown by the table.
pub fn calculate_vertical_bar_node_layout(
    node: &PositionedNode,
    feature_ids: impl IntoIterator<Item = FeatureId>,
    global_order: &[FeatureId],
    state_of: impl Fn(FeatureId) -> StripState,
    visible_ids: &FxHashSet<FeatureId>,
    colors: &StripColors,
) -> VerticalBarLayout {
    let mut rank: FxHashMap<FeatureId, usize> = FxHashMap::default();
    for (i, &id) in global_order.iter().enumerate() {
        rank.entry(id).or_insert(i);
    }

    let mut ids: Vec<FeatureId> = feature_ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids.sort_by_key(|id| (rank.get(id).copied().unwrap_or(usize::MAX), *id));

    let rect = node.rect();
    let strip_h = if ids.is_empty() {
        0.0
    } else {
        rect.height / ids.len() as f64
    };

    let strips: Vec<FeatureStrip> = ids
        .iter()
        .enumerate()
        .map(|(k, &feature_id)| {
            let state = state_of(feature_id);
            FeatureStrip {
                feature_id,
                rect: Rect::new(rect.x, rect.y + k as f64 * strip_h, rect.width, strip_h),
                state,
                color: colors.for_state(state).to_string(),
            }
        })
        .collect();

    let mut visible = ids
        .iter()
        .enumerate()
        .filter(|(_, id)| visible_ids.contains(*id))
        .map(|(k, _)| k);
    let scroll_indicator = visible.next().map(|first| {
        let last = visible.last().unwrap_or(first);
        Rect::new(
            rect.x,
            rect.y + first as f64 * strip_h,
            rect.width,
            (last - first + 1) as f64 * strip_h,
        )
    });

    VerticalBarLayout {
        node_id: node.id.clone(),
        rect,
        strips,
        scroll_indicator,
    }
}
