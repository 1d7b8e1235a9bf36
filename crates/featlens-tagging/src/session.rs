#![forbid(unsafe_code)]

//! Explicit application state for one labeling session.
//!
//! [`DashboardState`] owns everything the dashboard mutates: the feature
//! split tree, cached histograms and layouts, and per-stage tagging state
//! (selection, commit history, thresholds, scores, table paging). All
//! mutation goes through its methods; every change the host must hear
//! about is queued as a [`DashboardEvent`].
//!
//! # Stages
//!
//! | Stage              | Items          | Mode      |
//! |--------------------|----------------|-----------|
//! | `FeatureSplitting` | feature pairs  | `Pair`    |
//! | `Quality`          | features       | `Feature` |
//! | `Cause`            | features       | `Feature` |
//!
//! Entering a stage for the first time stores an initial commit holding the
//! working feature set. Revisiting a stage through one of its commits
//! restores both the tags and that feature set.
//!
//! # Invariants
//!
//! 1. Apply Threshold and Tag All by decision boundary only read scores that
//!    were computed for the current manual selection.
//! 2. Every Apply Threshold and Tag All produces exactly one commit.
//! 3. [`reset`](DashboardState::reset) returns to the freshly constructed
//!    state with the same config.

use std::fmt;

use featlens_core::{Category, FeatureId, FeatureTree, HistogramKey, ItemKey};
use featlens_layout::{
    HistogramChart, LayoutCache, LayoutError, SankeyLayout, create_histogram_chart,
    percentile_to_threshold,
};
use featlens_score::{calculate_bimodality_score, calculate_multimodality_score};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::boundary::{BoundaryLists, BoundaryPreview, BoundaryThresholds};
use crate::commit::{Commit, CommitHistory, CommitType};
use crate::config::DashboardConfig;
use crate::error::{Result, TaggingError};
use crate::events::{DashboardEvent, EventQueue};
use crate::histogram_cache::HistogramCache;
use crate::list::SortState;
use crate::pagination::Paginator;
use crate::selection::{
    ApplyOutcome, ScoreMap, SelectionMode, SelectionState, Tag, TagAllOutcome, TagAllStrategy,
    TagState,
};
use crate::staleness::{ScoreCache, ScoreRequest, SelectionSignature};

// ============================================================================
// Stage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FeatureSplitting,
    Quality,
    Cause,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Self::FeatureSplitting, Self::Quality, Self::Cause];

    #[must_use]
    pub const fn mode(self) -> SelectionMode {
        match self {
            Self::FeatureSplitting => SelectionMode::Pair,
            Self::Quality | Self::Cause => SelectionMode::Feature,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FeatureSplitting => "feature splitting",
            Self::Quality => "quality",
            Self::Cause => "cause",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// StageState
// ============================================================================

/// Tagging state of one stage.
#[derive(Debug, Clone)]
pub struct StageState {
    stage: Stage,
    selection: SelectionState,
    history: Option<CommitHistory>,
    items: Vec<ItemKey>,
    feature_ids: Vec<FeatureId>,
    boundary: Option<BoundaryThresholds>,
    scores: ScoreCache,
    preview: BoundaryPreview,
    distribution: Option<HistogramKey>,
    bimodality: f64,
    paginator: Paginator,
    sort: SortState,
}

impl StageState {
    fn new(stage: Stage, config: &DashboardConfig) -> Self {
        Self {
            stage,
            selection: SelectionState::new(stage.mode()),
            history: None,
            items: Vec::new(),
            feature_ids: Vec::new(),
            boundary: None,
            scores: ScoreCache::new(),
            preview: BoundaryPreview::new(),
            distribution: None,
            bimodality: 0.0,
            paginator: Paginator::new(0, config.tagging.page_size),
            sort: config.tagging.sort,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub fn history(&self) -> Option<&CommitHistory> {
        self.history.as_ref()
    }

    /// Items of the active table, in display order.
    #[must_use]
    pub fn items(&self) -> &[ItemKey] {
        &self.items
    }

    /// Working feature set.
    #[must_use]
    pub fn feature_ids(&self) -> &[FeatureId] {
        &self.feature_ids
    }

    #[must_use]
    pub fn boundary(&self) -> Option<BoundaryThresholds> {
        self.boundary
    }

    #[must_use]
    pub fn scores(&self) -> &ScoreCache {
        &self.scores
    }

    /// Bimodality score of the stage's score distribution.
    #[must_use]
    pub fn bimodality(&self) -> f64 {
        self.bimodality
    }

    #[must_use]
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator {
        &mut self.paginator
    }

    #[must_use]
    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn sort_mut(&mut self) -> &mut SortState {
        &mut self.sort
    }

    /// Replace the table items. The pager index is clamped to the new length.
    pub fn set_items(&mut self, items: Vec<ItemKey>) {
        self.paginator.set_len(items.len());
        self.items = items;
    }

    pub fn set_boundary(&mut self, boundary: BoundaryThresholds) {
        self.boundary = Some(boundary);
    }

    /// Histogram payload whose bimodality gates Tag All and whose reload
    /// freezes the boundary preview.
    pub fn set_distribution(&mut self, key: HistogramKey) {
        self.distribution = Some(key);
    }

    pub fn set_bimodality(&mut self, score: f64) {
        self.bimodality = score;
    }

    /// Current signature of the manual tags.
    #[must_use]
    pub fn signature(&self) -> SelectionSignature {
        SelectionSignature::of(&self.selection)
    }

    fn set_working_set(&mut self, feature_ids: Vec<FeatureId>) {
        if self.stage.mode() == SelectionMode::Feature {
            self.set_items(feature_ids.iter().copied().map(ItemKey::Feature).collect());
        }
        self.feature_ids = feature_ids;
    }

    fn ensure_entered(&self) -> Result<()> {
        if self.history.is_none() {
            return Err(TaggingError::StageNotEntered { stage: self.stage });
        }
        Ok(())
    }

    fn fresh_scores(&self) -> Result<&ScoreMap> {
        self.scores
            .fresh_scores(self.signature())
            .ok_or(TaggingError::StaleScores { stage: self.stage })
    }
}

// ============================================================================
// DashboardState
// ============================================================================

#[derive(Debug)]
pub struct DashboardState {
    config: DashboardConfig,
    tree: FeatureTree,
    histograms: HistogramCache,
    layouts: LayoutCache,
    stages: [StageState; 3],
    active: Stage,
    events: EventQueue,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl DashboardState {
    #[must_use]
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            tree: FeatureTree::default(),
            histograms: HistogramCache::new(),
            layouts: LayoutCache::default(),
            stages: Stage::ALL.map(|s| StageState::new(s, &config)),
            active: Stage::FeatureSplitting,
            events: EventQueue::new(),
        }
    }

    /// Start a new session with the same config.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
        tracing::debug!("dashboard.reset");
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub fn tree(&self) -> &FeatureTree {
        &self.tree
    }

    /// Replace the split tree. Cached histograms no longer apply.
    pub fn set_tree(&mut self, tree: FeatureTree) {
        self.tree = tree;
        self.histograms.clear();
    }

    #[must_use]
    pub fn histograms(&self) -> &HistogramCache {
        &self.histograms
    }

    pub fn histograms_mut(&mut self) -> &mut HistogramCache {
        &mut self.histograms
    }

    #[must_use]
    pub fn active_stage(&self) -> Stage {
        self.active
    }

    #[must_use]
    pub fn stage(&self, stage: Stage) -> &StageState {
        &self.stages[stage.index()]
    }

    pub fn stage_mut(&mut self, stage: Stage) -> &mut StageState {
        &mut self.stages[stage.index()]
    }

    fn active_mut(&mut self) -> &mut StageState {
        &mut self.stages[self.active.index()]
    }

    /// Take every pending outbound event.
    pub fn drain_events(&mut self) -> Vec<DashboardEvent> {
        self.events.drain().collect()
    }

    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    // ====================================================================
    // Stage navigation
    // ====================================================================

    /// Make `stage` active with `feature_ids` as its working set. The first
    /// entry stores the initial commit.
    pub fn enter_stage(&mut self, stage: Stage, feature_ids: Vec<FeatureId>) {
        self.save_active();
        let history_config = self.config.history;
        let state = self.stage_mut(stage);
        state.set_working_set(feature_ids);
        if state.history.is_none() {
            state.history = Some(CommitHistory::new(
                history_config,
                &state.selection,
                Some(state.feature_ids.clone()),
            ));
        }
        self.active = stage;
        tracing::debug!(
            %stage,
            features = self.stage(stage).feature_ids.len(),
            "dashboard.enter_stage"
        );
    }

    /// Return to `stage` as it was at commit `index`, restoring both tags and
    /// the working feature set frozen in that commit.
    pub fn revisit_stage(&mut self, stage: Stage, index: usize) -> Result<()> {
        let state = self.stage(stage);
        let history = state
            .history
            .as_ref()
            .ok_or(TaggingError::StageNotEntered { stage })?;
        let feature_ids = history
            .get(index)
            .ok_or(TaggingError::CommitOutOfRange {
                index,
                len: history.len(),
            })?
            .feature_ids
            .clone()
            .ok_or(TaggingError::NothingToRevisit { stage, index })?;

        if stage != self.active {
            self.save_active();
        }
        self.handle_commit_click(stage, index)?;
        self.stage_mut(stage).set_working_set(feature_ids);
        self.active = stage;
        Ok(())
    }

    fn save_active(&mut self) {
        let state = self.active_mut();
        if let Some(history) = state.history.as_mut() {
            history.save_current_state(&state.selection);
        }
    }

    // ====================================================================
    // Tagging
    // ====================================================================

    /// Tag one item of the active stage by hand.
    pub fn set_manual(&mut self, key: ItemKey, state: Option<TagState>) -> Result<Option<Tag>> {
        let stage = self.active;
        let previous = self.active_mut().selection.set_manual(key, state)?;
        self.events
            .push(DashboardEvent::SelectionToggled { stage, key, state });
        Ok(previous)
    }

    /// Cycle one item of the active stage.
    pub fn toggle(&mut self, key: ItemKey) -> Result<Option<TagState>> {
        let stage = self.active;
        let state = self.active_mut().selection.toggle(key)?;
        self.events
            .push(DashboardEvent::SelectionToggled { stage, key, state });
        Ok(state)
    }

    /// Auto-tag the active stage's untagged items in the boundary regions,
    /// then commit.
    pub fn apply_threshold(&mut self) -> Result<ApplyOutcome> {
        let stage = self.active;
        let state = self.active_mut();
        state.ensure_entered()?;
        let boundary = state.boundary.ok_or(TaggingError::NoBoundary { stage })?;
        let scores = state.fresh_scores()?.clone();
        let outcome = state
            .selection
            .apply_threshold(state.items.iter().copied(), &scores, boundary);
        self.commit(stage, CommitType::Apply)?;
        Ok(outcome)
    }

    /// Tag every remaining item of the active stage, then commit.
    pub fn tag_all(&mut self, strategy: TagAllStrategy) -> Result<TagAllOutcome> {
        let stage = self.active;
        let gate = self.config.tagging.bimodal_gate;
        let state = self.active_mut();
        state.ensure_entered()?;
        let scores = match strategy {
            TagAllStrategy::AsDefault => ScoreMap::default(),
            TagAllStrategy::ByDecisionBoundary => state.fresh_scores()?.clone(),
        };
        let outcome = state.selection.tag_all(
            state.items.iter().copied(),
            strategy,
            &scores,
            state.bimodality,
            gate,
        )?;
        self.commit(stage, CommitType::TagAll)?;
        Ok(outcome)
    }

    fn commit(&mut self, stage: Stage, commit_type: CommitType) -> Result<()> {
        let state = &mut self.stages[stage.index()];
        let feature_ids = Some(state.feature_ids.clone());
        let selection = &state.selection;
        let history = state
            .history
            .as_mut()
            .ok_or(TaggingError::StageNotEntered { stage })?;
        let commit = history.create_commit(commit_type, selection, feature_ids).clone();
        self.events
            .push(DashboardEvent::CommitCreated { stage, commit });
        Ok(())
    }

    /// Save scratch work on `stage`, then restore its commit `index`.
    pub fn handle_commit_click(&mut self, stage: Stage, index: usize) -> Result<&Commit> {
        let state = &mut self.stages[stage.index()];
        let selection = &mut state.selection;
        let history = state
            .history
            .as_mut()
            .ok_or(TaggingError::StageNotEntered { stage })?;
        history.handle_commit_click(index, selection)
    }

    /// Commit history of `stage`.
    pub fn history(&self, stage: Stage) -> Result<&CommitHistory> {
        self.stage(stage)
            .history
            .as_ref()
            .ok_or(TaggingError::StageNotEntered { stage })
    }

    // ====================================================================
    // Scores and boundary preview
    // ====================================================================

    /// Start a score computation for `stage` if its scores are stale and
    /// none is running.
    pub fn request_scores(&mut self, stage: Stage) -> Option<ScoreRequest> {
        let state = self.stage_mut(stage);
        let signature = state.signature();
        state.scores.begin_request(signature)
    }

    pub fn receive_scores(&mut self, stage: Stage, request: ScoreRequest, scores: ScoreMap) {
        self.stage_mut(stage).scores.complete(request, scores);
    }

    pub fn score_request_failed(&mut self, stage: Stage, request: ScoreRequest) {
        self.stage_mut(stage).scores.fail(request);
    }

    /// Boundary lists of `stage`, held still while its distribution reloads
    /// or its scores are stale.
    pub fn boundary_lists(&mut self, stage: Stage) -> &BoundaryLists {
        let loading = self.stages[stage.index()]
            .distribution
            .as_ref()
            .is_some_and(|k| self.histograms.is_loading(k));
        let state = &mut self.stages[stage.index()];
        let signature = state.signature();
        let Some(boundary) = state.boundary else {
            return state.preview.lists();
        };
        state.preview.refresh(
            state.items.iter().copied(),
            &state.scores,
            signature,
            boundary,
            loading,
        )
    }

    /// Recompute `stage`'s bimodality score from its cached distribution.
    /// Multi-category payloads average their categories.
    pub fn refresh_bimodality(&mut self, stage: Stage) -> Option<f64> {
        let key = self.stage(stage).distribution.clone()?;
        let payload = self.histograms.get(&key)?;
        let score = if payload.multimodality.is_empty() {
            calculate_bimodality_score(payload.bimodality.as_ref()?).score
        } else {
            calculate_multimodality_score(&payload.multimodality).score
        };
        self.stage_mut(stage).bimodality = score;
        Some(score)
    }

    // ====================================================================
    // Split thresholds
    // ====================================================================

    /// Re-split `node_id` at `thresholds`. Histograms cached for the old
    /// subtree are dropped. Returns the new child ids.
    pub fn set_split_thresholds(
        &mut self,
        node_id: &str,
        thresholds: &[f64],
        scores: &FxHashMap<FeatureId, f64>,
    ) -> Result<Vec<String>> {
        let old_subtree = self.tree.subtree_ids(node_id);
        let children = self.tree.set_thresholds(node_id, thresholds, scores)?;
        self.histograms
            .invalidate_nodes(old_subtree.iter().skip(1).map(String::as_str));
        self.events.push(DashboardEvent::ThresholdsUpdated {
            node_id: node_id.to_string(),
            thresholds: thresholds.to_vec(),
        });
        Ok(children)
    }

    /// Re-split `node_id` at the given percentiles (fractions in `0..=1`) of
    /// its cached `metric` histogram.
    pub fn set_split_percentiles(
        &mut self,
        node_id: &str,
        metric: &str,
        percentiles: &[f64],
        scores: &FxHashMap<FeatureId, f64>,
    ) -> Result<Vec<String>> {
        let key = HistogramKey::new(metric, node_id);
        let payload = self
            .histograms
            .get(&key)
            .ok_or_else(|| TaggingError::MissingHistogram {
                key: key.to_string(),
            })?;
        let thresholds = percentiles
            .iter()
            .map(|&p| {
                percentile_to_threshold(&payload.histogram, p).ok_or_else(|| {
                    LayoutError::histogram(format!("{key}: no value at percentile {p}"))
                })
            })
            .collect::<std::result::Result<Vec<f64>, LayoutError>>()?;

        let category = self
            .tree
            .children(node_id)
            .first()
            .map_or(Category::Other, |c| c.category);
        let old_subtree = self.tree.subtree_ids(node_id);
        let children = self
            .tree
            .split_node(node_id, metric, &thresholds, category, scores)?;
        self.histograms
            .invalidate_nodes(old_subtree.iter().skip(1).map(String::as_str));
        self.events
            .push(DashboardEvent::ThresholdsUpdatedByPercentile {
                node_id: node_id.to_string(),
                percentiles: percentiles.to_vec(),
            });
        Ok(children)
    }

    // ====================================================================
    // Layout
    // ====================================================================

    /// Sankey layout of the current tree, memoized.
    pub fn sankey_layout(&mut self, width: f64, height: f64) -> Result<SankeyLayout> {
        let data = self.tree.to_dataset();
        Ok(self
            .layouts
            .layout(&data, width, height, &self.config.sankey)?)
    }

    /// Chart of a cached histogram.
    pub fn histogram_chart(
        &self,
        key: &HistogramKey,
        width: f64,
        height: f64,
    ) -> Result<HistogramChart> {
        let payload = self
            .histograms
            .get(key)
            .ok_or_else(|| TaggingError::MissingHistogram {
                key: key.to_string(),
            })?;
        Ok(create_histogram_chart(
            payload,
            width,
            height,
            &self.config.histogram,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TagSource;
    use featlens_core::{
        BimodalityInfo, GmmComponent, Histogram, HistogramPayload, HistogramStatistics, NodeSpec,
        PairKey,
    };

    fn f(id: u32) -> ItemKey {
        ItemKey::Feature(id)
    }

    fn bimodal_payload() -> HistogramPayload {
        HistogramPayload {
            metric: "decoder_similarity".into(),
            histogram: Histogram::new(vec![0.0, 0.25, 0.5, 0.75, 1.0], vec![10, 2, 2, 10]),
            statistics: Some(HistogramStatistics {
                min: 0.0,
                max: 1.0,
                mean: 0.5,
                sample_size: 24,
            }),
            bimodality: Some(BimodalityInfo {
                dip_pvalue: 0.0,
                bic_k1: 100.0,
                bic_k2: 80.0,
                gmm_components: vec![
                    GmmComponent::new(0.1, 0.01, 0.5),
                    GmmComponent::new(0.9, 0.01, 0.5),
                ],
                sample_size: 24,
            }),
            ..HistogramPayload::default()
        }
    }

    fn quality_session() -> DashboardState {
        let mut dash = DashboardState::default();
        dash.enter_stage(Stage::Quality, vec![1, 2, 3, 4]);
        dash.stage_mut(Stage::Quality)
            .set_boundary(BoundaryThresholds::new(0.2, 0.8).unwrap());
        dash
    }

    fn feed_scores(dash: &mut DashboardState, pairs: &[(u32, f64)]) {
        let request = dash.request_scores(Stage::Quality).unwrap();
        let scores = pairs.iter().map(|&(id, s)| (f(id), s)).collect();
        dash.receive_scores(Stage::Quality, request, scores);
    }

    #[test]
    fn entering_a_stage_stores_initial_commit() {
        let dash = quality_session();
        let state = dash.stage(Stage::Quality);
        assert_eq!(dash.active_stage(), Stage::Quality);
        assert_eq!(state.items().len(), 4);
        assert_eq!(state.paginator().len(), 4);
        let history = state.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.initial().feature_ids.as_deref(),
            Some(&[1, 2, 3, 4][..])
        );
    }

    #[test]
    fn apply_threshold_needs_fresh_scores_and_commits() {
        let mut dash = quality_session();
        assert_eq!(
            dash.apply_threshold().unwrap_err(),
            TaggingError::StaleScores {
                stage: Stage::Quality
            }
        );
        feed_scores(&mut dash, &[(1, 0.1), (2, 0.5), (3, 0.9)]);
        let outcome = dash.apply_threshold().unwrap();
        assert_eq!((outcome.selected, outcome.rejected), (1, 1));
        let state = dash.stage(Stage::Quality);
        assert_eq!(state.selection().source(&f(1)), Some(TagSource::Auto));
        assert_eq!(state.history().unwrap().len(), 2);
        let events = dash.drain_events();
        assert!(matches!(
            events.last(),
            Some(DashboardEvent::CommitCreated {
                stage: Stage::Quality,
                ..
            })
        ));
    }

    #[test]
    fn manual_edits_make_scores_stale() {
        let mut dash = quality_session();
        feed_scores(&mut dash, &[(1, 0.1)]);
        dash.toggle(f(4)).unwrap();
        assert!(dash.request_scores(Stage::Quality).is_some());
        assert!(dash.request_scores(Stage::Quality).is_none());
        assert!(matches!(
            dash.drain_events().first(),
            Some(DashboardEvent::SelectionToggled {
                state: Some(TagState::Selected),
                ..
            })
        ));
    }

    #[test]
    fn tag_all_is_gated_by_bimodality() {
        let mut dash = quality_session();
        assert!(matches!(
            dash.tag_all(TagAllStrategy::AsDefault),
            Err(TaggingError::NotBimodal { .. })
        ));

        let key = HistogramKey::new("decoder_similarity", "root");
        dash.histograms_mut().insert(key.clone(), bimodal_payload());
        dash.stage_mut(Stage::Quality).set_distribution(key);
        let score = dash.refresh_bimodality(Stage::Quality).unwrap();
        assert!(score >= 0.83, "score {score}");

        dash.set_manual(f(2), Some(TagState::Selected)).unwrap();
        let outcome = dash.tag_all(TagAllStrategy::AsDefault).unwrap();
        assert_eq!(outcome.rejected, 3);
        let sel = dash.stage(Stage::Quality).selection();
        assert_eq!(sel.get(&f(2)), Some(Tag::manual(TagState::Selected)));
        assert_eq!(dash.stage(Stage::Quality).history().unwrap().len(), 2);
    }

    #[test]
    fn revisit_restores_frozen_feature_set() {
        let mut dash = quality_session();
        dash.set_manual(f(1), Some(TagState::Rejected)).unwrap();
        dash.enter_stage(Stage::Cause, vec![2, 3]);
        dash.enter_stage(Stage::Quality, vec![9]);
        assert_eq!(dash.stage(Stage::Quality).feature_ids(), &[9]);

        dash.revisit_stage(Stage::Quality, 0).unwrap();
        let state = dash.stage(Stage::Quality);
        assert_eq!(state.feature_ids(), &[1, 2, 3, 4]);
        assert_eq!(state.selection().state(&f(1)), Some(TagState::Rejected));
        assert_eq!(dash.active_stage(), Stage::Quality);

        assert_eq!(
            dash.revisit_stage(Stage::FeatureSplitting, 0),
            Err(TaggingError::StageNotEntered {
                stage: Stage::FeatureSplitting
            })
        );
    }

    #[test]
    fn pair_stage_takes_pair_keys() {
        let mut dash = DashboardState::default();
        dash.enter_stage(Stage::FeatureSplitting, vec![1, 2]);
        dash.stage_mut(Stage::FeatureSplitting)
            .set_items(vec![ItemKey::Pair(PairKey::new(1, 2))]);
        assert!(dash.toggle(ItemKey::Pair(PairKey::new(1, 2))).is_ok());
        assert!(dash.toggle(f(1)).is_err());
    }

    #[test]
    fn boundary_lists_freeze_while_distribution_loads() {
        let mut dash = quality_session();
        feed_scores(&mut dash, &[(1, 0.1), (4, 0.95)]);
        let first = dash.boundary_lists(Stage::Quality).clone();
        assert_eq!(first.reject_below.len(), 1);
        assert_eq!(first.select_above.len(), 1);

        let key = HistogramKey::new("m", "root");
        dash.stage_mut(Stage::Quality).set_distribution(key.clone());
        dash.histograms_mut().mark_loading(key);
        dash.stage_mut(Stage::Quality)
            .set_boundary(BoundaryThresholds::new(0.5, 0.99).unwrap());
        assert_eq!(dash.boundary_lists(Stage::Quality), &first);
    }

    #[test]
    fn split_thresholds_update_tree_and_emit() {
        let mut dash = DashboardState::default();
        dash.set_tree(FeatureTree::with_root(
            NodeSpec::new("root").with_features(0..4),
        ));
        let scores: FxHashMap<FeatureId, f64> =
            [(0, 0.1), (1, 0.2), (2, 0.6), (3, 0.9)].into_iter().collect();
        dash.tree
            .split_node("root", "m", &[0.5], Category::FeatureSplitting, &scores)
            .unwrap();
        dash.histograms_mut()
            .insert(HistogramKey::new("m", "root_0"), bimodal_payload());
        dash.histograms_mut()
            .insert(HistogramKey::new("m", "root"), bimodal_payload());

        let children = dash.set_split_thresholds("root", &[0.15, 0.7], &scores).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(dash.tree().get("root_1").unwrap().feature_count, 2);
        assert_eq!(dash.histograms().len(), 1);
        assert_eq!(
            dash.drain_events(),
            vec![DashboardEvent::ThresholdsUpdated {
                node_id: "root".into(),
                thresholds: vec![0.15, 0.7],
            }]
        );

        let layout = dash.sankey_layout(800.0, 400.0).unwrap();
        assert_eq!(layout.nodes.len(), 4);
    }

    #[test]
    fn percentile_split_reads_cached_histogram() {
        let mut dash = DashboardState::default();
        dash.set_tree(FeatureTree::with_root(
            NodeSpec::new("root").with_features(0..4),
        ));
        let scores = FxHashMap::default();
        assert!(matches!(
            dash.set_split_percentiles("root", "m", &[0.5], &scores),
            Err(TaggingError::MissingHistogram { .. })
        ));
        dash.histograms_mut()
            .insert(HistogramKey::new("m", "root"), bimodal_payload());
        dash.set_split_percentiles("root", "m", &[0.5], &scores)
            .unwrap();
        assert_eq!(dash.tree().children("root").len(), 2);
        assert_eq!(dash.tree().get("root").unwrap().metric.as_deref(), Some("m"));
        assert!(matches!(
            dash.drain_events().as_slice(),
            [DashboardEvent::ThresholdsUpdatedByPercentile { .. }]
        ));
    }

    #[test]
    fn bulk_tagging_needs_an_entered_stage() {
        let mut dash = DashboardState::default();
        assert_eq!(
            dash.tag_all(TagAllStrategy::AsDefault).unwrap_err(),
            TaggingError::StageNotEntered {
                stage: Stage::FeatureSplitting
            }
        );
        assert!(dash.stage(Stage::FeatureSplitting).selection().is_empty());
    }

    #[test]
    fn reset_starts_over() {
        let mut dash = quality_session();
        dash.toggle(f(1)).unwrap();
        dash.reset();
        assert_eq!(dash.active_stage(), Stage::FeatureSplitting);
        assert!(dash.stage(Stage::Quality).history().is_none());
        assert_eq!(dash.pending_events(), 0);
    }
}
