#![forbid(unsafe_code)]

//! Per-item tagging state with provenance.
//!
//! Every item is either untagged or carries a [`Tag`]: a state
//! (`Selected`/`Rejected`) plus the source that set it (`Manual`/`Auto`).
//! State and source live in one entry, so a source can never exist without
//! a state.
//!
//! # Transitions
//!
//! | Operation                  | Touches            | Stamps            |
//! |----------------------------|--------------------|-------------------|
//! | [`set_manual`]             | one item, any tag  | `Manual`          |
//! | [`toggle`]                 | one item, any tag  | `Manual`          |
//! | [`apply_threshold`]        | untagged items     | `Auto`            |
//! | [`tag_all`] (`AsDefault`)  | untagged items     | `Rejected/Manual` |
//! | [`tag_all`] (`ByDecisionBoundary`) | untagged items | `Auto`       |
//!
//! # Invariants
//!
//! 1. Bulk operations never modify an item that already has a tag.
//! 2. Every key matches the selection's [`SelectionMode`].
//! 3. [`restore`](SelectionState::restore) of a [`snapshot`](SelectionState::snapshot)
//!    reproduces the exact tag map.
//!
//! [`set_manual`]: SelectionState::set_manual
//! [`toggle`]: SelectionState::toggle
//! [`apply_threshold`]: SelectionState::apply_threshold
//! [`tag_all`]: SelectionState::tag_all

use std::collections::BTreeMap;

use featlens_core::ItemKey;
use featlens_score::is_bimodal_with_gate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryThresholds;
use crate::error::{Result, TaggingError};

/// Similarity or decision-margin score per item.
pub type ScoreMap = FxHashMap<ItemKey, f64>;

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagState {
    Selected,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    Manual,
    Auto,
}

/// A set tag: state and who set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub state: TagState,
    pub source: TagSource,
}

impl Tag {
    #[must_use]
    pub const fn manual(state: TagState) -> Self {
        Self {
            state,
            source: TagSource::Manual,
        }
    }

    #[must_use]
    pub const fn auto(state: TagState) -> Self {
        Self {
            state,
            source: TagSource::Auto,
        }
    }
}

/// Which kind of key a selection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Feature pairs (feature splitting).
    Pair,
    /// Single features.
    Feature,
}

impl SelectionMode {
    #[must_use]
    pub const fn accepts(self, key: &ItemKey) -> bool {
        matches!(
            (self, key),
            (Self::Pair, ItemKey::Pair(_)) | (Self::Feature, ItemKey::Feature(_))
        )
    }
}

/// How Tag All fills the remaining untagged items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagAllStrategy {
    /// Reject everything left.
    AsDefault,
    /// Select when the score is `>= 0`, reject otherwise or when unscored.
    ByDecisionBoundary,
}

// ============================================================================
// Outcomes and counts
// ============================================================================

/// Result of one Apply Threshold pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub selected: usize,
    pub rejected: usize,
    /// Items inside a region that were left alone because they were tagged.
    pub already_tagged: usize,
}

/// Result of one Tag All pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagAllOutcome {
    pub selected: usize,
    pub rejected: usize,
    /// Items rejected only because they had no score.
    pub unscored: Vec<ItemKey>,
}

/// Tallies of a selection, optionally against a known item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionCounts {
    pub selected: usize,
    pub rejected: usize,
    pub manual: usize,
    pub auto: usize,
    /// Untagged items; zero unless counted over an item list.
    pub unset: usize,
}

impl SelectionCounts {
    fn add(&mut self, tag: Tag) {
        match tag.state {
            TagState::Selected => self.selected += 1,
            TagState::Rejected => self.rejected += 1,
        }
        match tag.source {
            TagSource::Manual => self.manual += 1,
            TagSource::Auto => self.auto += 1,
        }
    }

    #[must_use]
    pub const fn tagged(&self) -> usize {
        self.selected + self.rejected
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Deep copy of a selection, stored by commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub mode: SelectionMode,
    #[serde(with = "entries")]
    pub tags: BTreeMap<ItemKey, Tag>,
}

impl SelectionSnapshot {
    #[must_use]
    pub fn state(&self, key: &ItemKey) -> Option<TagState> {
        self.tags.get(key).map(|t| t.state)
    }

    #[must_use]
    pub fn source(&self, key: &ItemKey) -> Option<TagSource> {
        self.tags.get(key).map(|t| t.source)
    }

    /// The `states` view of the snapshot.
    pub fn states(&self) -> impl Iterator<Item = (&ItemKey, TagState)> {
        self.tags.iter().map(|(k, t)| (k, t.state))
    }

    /// The `sources` view of the snapshot.
    pub fn sources(&self) -> impl Iterator<Item = (&ItemKey, TagSource)> {
        self.tags.iter().map(|(k, t)| (k, t.source))
    }
}

/// Maps keyed by [`ItemKey`] serialize as `[key, value]` lists since the
/// key is not a string.
mod entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Vec::<(K, V)>::deserialize(deserializer).map(|v| v.into_iter().collect())
    }
}

// ============================================================================
// SelectionState
// ============================================================================

/// Live tagging state of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    mode: SelectionMode,
    tags: BTreeMap<ItemKey, Tag>,
}

impl SelectionState {
    #[must_use]
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            tags: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    #[must_use]
    pub fn get(&self, key: &ItemKey) -> Option<Tag> {
        self.tags.get(key).copied()
    }

    #[must_use]
    pub fn state(&self, key: &ItemKey) -> Option<TagState> {
        self.tags.get(key).map(|t| t.state)
    }

    #[must_use]
    pub fn source(&self, key: &ItemKey) -> Option<TagSource> {
        self.tags.get(key).map(|t| t.source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tagged items in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &Tag)> {
        self.tags.iter()
    }

    /// Tagged items whose source is `Manual`, in key order.
    pub fn manual(&self) -> impl Iterator<Item = (&ItemKey, TagState)> {
        self.tags
            .iter()
            .filter(|(_, t)| t.source == TagSource::Manual)
            .map(|(k, t)| (k, t.state))
    }

    fn check_mode(&self, key: &ItemKey) -> Result<()> {
        if self.mode.accepts(key) {
            Ok(())
        } else {
            Err(TaggingError::WrongMode {
                key: *key,
                mode: self.mode,
            })
        }
    }

    /// Tag `key` by hand, or clear it with `None`. Overwrites any prior tag.
    /// Returns the previous tag.
    pub fn set_manual(&mut self, key: ItemKey, state: Option<TagState>) -> Result<Option<Tag>> {
        self.check_mode(&key)?;
        Ok(match state {
            Some(state) => self.tags.insert(key, Tag::manual(state)),
            None => self.tags.remove(&key),
        })
    }

    /// Cycle `key` through unset -> selected -> rejected -> unset. Returns
    /// the new state.
    pub fn toggle(&mut self, key: ItemKey) -> Result<Option<TagState>> {
        let next = match self.state(&key) {
            None => Some(TagState::Selected),
            Some(TagState::Selected) => Some(TagState::Rejected),
            Some(TagState::Rejected) => None,
        };
        self.set_manual(key, next)?;
        Ok(next)
    }

    /// Auto-tag untagged `items` whose score falls in a boundary region:
    /// below `reject` becomes rejected, at or above `select` becomes
    /// selected. Unscored and already tagged items are left alone.
    pub fn apply_threshold<I>(
        &mut self,
        items: I,
        scores: &ScoreMap,
        thresholds: BoundaryThresholds,
    ) -> ApplyOutcome
    where
        I: IntoIterator<Item = ItemKey>,
    {
        let mut outcome = ApplyOutcome::default();
        for key in items {
            if !self.mode.accepts(&key) {
                continue;
            }
            let Some(state) = scores
                .get(&key)
                .and_then(|&score| thresholds.region_state(score))
            else {
                continue;
            };
            if self.tags.contains_key(&key) {
                outcome.already_tagged += 1;
                continue;
            }
            self.tags.insert(key, Tag::auto(state));
            match state {
                TagState::Selected => outcome.selected += 1,
                TagState::Rejected => outcome.rejected += 1,
            }
        }
        tracing::debug!(
            selected = outcome.selected,
            rejected = outcome.rejected,
            already_tagged = outcome.already_tagged,
            "selection.apply_threshold"
        );
        outcome
    }

    /// Tag every untagged item of `items`. Only allowed when
    /// `bimodality_score` clears `gate`; tagged items are never modified.
    pub fn tag_all<I>(
        &mut self,
        items: I,
        strategy: TagAllStrategy,
        scores: &ScoreMap,
        bimodality_score: f64,
        gate: f64,
    ) -> Result<TagAllOutcome>
    where
        I: IntoIterator<Item = ItemKey>,
    {
        if !is_bimodal_with_gate(bimodality_score, gate) {
            return Err(TaggingError::NotBimodal {
                score: bimodality_score,
                gate,
            });
        }
        let mut outcome = TagAllOutcome::default();
        for key in items {
            if !self.mode.accepts(&key) || self.tags.contains_key(&key) {
                continue;
            }
            let tag = match strategy {
                TagAllStrategy::AsDefault => Tag::manual(TagState::Rejected),
                TagAllStrategy::ByDecisionBoundary => match scores.get(&key) {
                    Some(&score) if score >= 0.0 => Tag::auto(TagState::Selected),
                    Some(&score) if score < 0.0 => Tag::auto(TagState::Rejected),
                    _ => {
                        outcome.unscored.push(key);
                        Tag::auto(TagState::Rejected)
                    }
                },
            };
            match tag.state {
                TagState::Selected => outcome.selected += 1,
                TagState::Rejected => outcome.rejected += 1,
            }
            self.tags.insert(key, tag);
        }
        tracing::debug!(
            ?strategy,
            selected = outcome.selected,
            rejected = outcome.rejected,
            unscored = outcome.unscored.len(),
            "selection.tag_all"
        );
        Ok(outcome)
    }

    /// Remove every tag.
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Tallies over tagged items only.
    #[must_use]
    pub fn counts(&self) -> SelectionCounts {
        let mut counts = SelectionCounts::default();
        for tag in self.tags.values() {
            counts.add(*tag);
        }
        counts
    }

    /// Tallies over `items`, including untagged ones.
    #[must_use]
    pub fn counts_over<'a, I>(&self, items: I) -> SelectionCounts
    where
        I: IntoIterator<Item = &'a ItemKey>,
    {
        let mut counts = SelectionCounts::default();
        for key in items {
            match self.tags.get(key) {
                Some(tag) => counts.add(*tag),
                None => counts.unset += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            mode: self.mode,
            tags: self.tags.clone(),
        }
    }

    /// Replace the live state with `snapshot`.
    pub fn restore(&mut self, snapshot: &SelectionSnapshot) {
        self.mode = snapshot.mode;
        self.tags = snapshot.tags.clone();
    }
}

impl From<&SelectionSnapshot> for SelectionState {
    fn from(snapshot: &SelectionSnapshot) -> Self {
        Self {
            mode: snapshot.mode,
            tags: snapshot.tags.clone(),
        }
    }
}
