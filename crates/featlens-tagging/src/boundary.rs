#![forbid(unsafe_code)]

//! Boundary preview lists around the reject/select thresholds.
//!
//! Items scoring below `reject` form the reject list, sorted descending so
//! the most marginal rejects come first. Items scoring at or above `select`
//! form the select list, sorted ascending for the same reason. Items
//! without a score are left out of both.
//!
//! # Invariants
//!
//! 1. No item appears in both lists, whatever the thresholds.
//! 2. [`BoundaryPreview`] only recomputes from scores that match the current
//!    selection signature, so lists never mix stale scores with fresh state.
//!
//! # Failure Modes
//!
//! - While the histogram payload is reloading, or the scores are stale,
//!   [`BoundaryPreview::refresh`] keeps returning the previous lists.

use featlens_core::ItemKey;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggingError};
use crate::selection::{ScoreMap, TagState};
use crate::staleness::{ScoreCache, SelectionSignature};

/// Reject-below and select-above cut points, `reject <= select`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryThresholds {
    pub reject: f64,
    pub select: f64,
}

impl BoundaryThresholds {
    pub fn new(reject: f64, select: f64) -> Result<Self> {
        if !(reject.is_finite() && select.is_finite() && reject <= select) {
            return Err(TaggingError::InvalidBoundary { reject, select });
        }
        Ok(Self { reject, select })
    }

    /// First and last entries of a slider's threshold list. A single
    /// threshold is used for both.
    pub fn from_slider(thresholds: &[f64]) -> Option<Result<Self>> {
        let reject = *thresholds.first()?;
        let select = *thresholds.last()?;
        Some(Self::new(reject, select))
    }

    /// State a score maps to, if it falls in a boundary region.
    #[must_use]
    pub fn region_state(&self, score: f64) -> Option<TagState> {
        if score < self.reject {
            Some(TagState::Rejected)
        } else if score >= self.select {
            Some(TagState::Selected)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryItem {
    pub key: ItemKey,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryLists {
    pub reject_below: Vec<BoundaryItem>,
    pub select_above: Vec<BoundaryItem>,
}

impl BoundaryLists {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reject_below.is_empty() && self.select_above.is_empty()
    }
}

/// Split scored `items` into the two boundary lists.
#[must_use]
pub fn classify_boundary_items<I>(
    items: I,
    scores: &ScoreMap,
    thresholds: BoundaryThresholds,
) -> BoundaryLists
where
    I: IntoIterator<Item = ItemKey>,
{
    let mut lists = BoundaryLists::default();
    for key in items {
        let Some(&score) = scores.get(&key) else {
            continue;
        };
        if score.is_nan() {
            continue;
        }
        match thresholds.region_state(score) {
            Some(TagState::Rejected) => lists.reject_below.push(BoundaryItem { key, score }),
            Some(TagState::Selected) => lists.select_above.push(BoundaryItem { key, score }),
            None => {}
        }
    }
    lists
        .reject_below
        .sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
    lists
        .select_above
        .sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.key.cmp(&b.key)));
    lists
}

// ============================================================================
// Frozen preview
// ============================================================================

/// Boundary lists that hold still while inputs are in flux.
#[derive(Debug, Clone, Default)]
pub struct BoundaryPreview {
    lists: BoundaryLists,
    computed_for: Option<(SelectionSignature, u64, u64)>,
}

impl BoundaryPreview {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last computed lists.
    #[must_use]
    pub fn lists(&self) -> &BoundaryLists {
        &self.lists
    }

    /// Recompute when the scores are fresh for `signature` and nothing is
    /// loading; otherwise return the previous lists unchanged.
    pub fn refresh<I>(
        &mut self,
        items: I,
        cache: &ScoreCache,
        signature: SelectionSignature,
        thresholds: BoundaryThresholds,
        loading: bool,
    ) -> &BoundaryLists
    where
        I: IntoIterator<Item = ItemKey>,
    {
        if loading {
            return &self.lists;
        }
        let Some(scores) = cache.fresh_scores(signature) else {
            return &self.lists;
        };
        let stamp = (
            signature,
            thresholds.reject.to_bits(),
            thresholds.select.to_bits(),
        );
        self.lists = classify_boundary_items(items, scores, thresholds);
        self.computed_for = Some(stamp);
        &self.lists
    }

    /// Whether the current lists were computed for `signature` and
    /// `thresholds`.
    #[must_use]
    pub fn is_current(&self, signature: SelectionSignature, thresholds: BoundaryThresholds) -> bool {
        self.computed_for
            == Some((
                signature,
                thresholds.reject.to_bits(),
                thresholds.select.to_bits(),
            ))
    }

    pub fn clear(&mut self) {
        self.lists = BoundaryLists::default();
        self.computed_for = None;
    }
}
