#![forbid(unsafe_code)]

//! Score staleness and in-flight request tracking.
//!
//! Similarity scores are computed remotely from the current set of manual
//! tags. [`SelectionSignature`] fingerprints that set; [`ScoreCache`]
//! remembers which signature its scores belong to and whether a request is
//! already running.
//!
//! # Invariants
//!
//! 1. At most one request is in flight at a time.
//! 2. A new request is only issued when the signature differs from the one
//!    the cached scores were computed for.
//! 3. Completed responses overwrite the cache (last write wins), even when
//!    they answer an older request.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::selection::{ScoreMap, SelectionState};

/// Fingerprint of the manual tags of a selection. Auto tags do not count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionSignature(pub u64);

impl SelectionSignature {
    #[must_use]
    pub fn of(selection: &SelectionState) -> Self {
        let mut hasher = FxHasher::default();
        selection.mode().hash(&mut hasher);
        for (key, state) in selection.manual() {
            key.hash(&mut hasher);
            state.hash(&mut hasher);
        }
        Self(hasher.finish())
    }
}

/// Ticket for one outstanding score computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRequest {
    pub id: u64,
    pub signature: SelectionSignature,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    scores: ScoreMap,
    computed_for: Option<SelectionSignature>,
    in_flight: Option<ScoreRequest>,
    next_id: u64,
}

impl ScoreCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether scores computed for `current` are missing and no request is
    /// already running.
    #[must_use]
    pub fn needs_request(&self, current: SelectionSignature) -> bool {
        self.computed_for != Some(current) && self.in_flight.is_none()
    }

    /// Start a request for `current` if one is needed.
    pub fn begin_request(&mut self, current: SelectionSignature) -> Option<ScoreRequest> {
        if !self.needs_request(current) {
            return None;
        }
        let request = ScoreRequest {
            id: self.next_id,
            signature: current,
        };
        self.next_id += 1;
        self.in_flight = Some(request);
        tracing::debug!(id = request.id, signature = current.0, "score_cache.request");
        Some(request)
    }

    /// Store the response to `request`.
    pub fn complete(&mut self, request: ScoreRequest, scores: ScoreMap) {
        if self.in_flight.is_some_and(|r| r.id == request.id) {
            self.in_flight = None;
        }
        tracing::debug!(
            id = request.id,
            signature = request.signature.0,
            scores = scores.len(),
            "score_cache.complete"
        );
        self.scores = scores;
        self.computed_for = Some(request.signature);
    }

    /// Drop `request` without storing anything.
    pub fn fail(&mut self, request: ScoreRequest) {
        if self.in_flight.is_some_and(|r| r.id == request.id) {
            self.in_flight = None;
        }
        tracing::warn!(id = request.id, "score_cache.failed");
    }

    #[must_use]
    pub fn is_stale(&self, current: SelectionSignature) -> bool {
        self.computed_for != Some(current)
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<ScoreRequest> {
        self.in_flight
    }

    /// Scores, but only if they were computed for `current`.
    #[must_use]
    pub fn fresh_scores(&self, current: SelectionSignature) -> Option<&ScoreMap> {
        (self.computed_for == Some(current)).then_some(&self.scores)
    }

    /// Last stored scores, fresh or not.
    #[must_use]
    pub fn scores(&self) -> &ScoreMap {
        &self.scores
    }

    /// Forget which signature the scores belong to, forcing a new request.
    pub fn invalidate(&mut self) {
        self.computed_for = None;
    }

    pub fn clear(&mut self) {
        *self = Self {
            next_id: self.next_id,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryThresholds;
    use crate::selection::{SelectionMode, TagState};
    use featlens_core::ItemKey;

    fn scores(v: f64) -> ScoreMap {
        [(ItemKey::Feature(1), v)].into_iter().collect()
    }

    #[test]
    fn signature_ignores_auto_tags() {
        let mut sel = SelectionState::new(SelectionMode::Feature);
        let empty = SelectionSignature::of(&sel);
        sel.apply_threshold(
            [ItemKey::Feature(1)],
            &scores(0.0),
            BoundaryThresholds::new(0.5, 0.9).unwrap(),
        );
        assert_eq!(SelectionSignature::of(&sel), empty);
        sel.set_manual(ItemKey::Feature(2), Some(TagState::Selected)).unwrap();
        assert_ne!(SelectionSignature::of(&sel), empty);
    }

    #[test]
    fn only_one_request_in_flight() {
        let mut cache = ScoreCache::new();
        let a = SelectionSignature(1);
        let b = SelectionSignature(2);
        let first = cache.begin_request(a).unwrap();
        assert!(cache.begin_request(a).is_none());
        assert!(cache.begin_request(b).is_none());
        cache.complete(first, scores(0.3));
        assert!(!cache.is_stale(a));
        assert!(cache.begin_request(a).is_none());
        assert!(cache.is_stale(b));
        assert!(cache.begin_request(b).is_some());
    }

    #[test]
    fn stale_scores_are_withheld() {
        let mut cache = ScoreCache::new();
        let a = SelectionSignature(1);
        let req = cache.begin_request(a).unwrap();
        cache.complete(req, scores(0.3));
        assert!(cache.fresh_scores(a).is_some());
        assert!(cache.fresh_scores(SelectionSignature(9)).is_none());
        assert_eq!(cache.scores().len(), 1);
        cache.invalidate();
        assert!(cache.fresh_scores(a).is_none());
    }

    #[test]
    fn late_response_wins() {
        let mut cache = ScoreCache::new();
        let old = cache.begin_request(SelectionSignature(1)).unwrap();
        cache.fail(old);
        let new = cache.begin_request(SelectionSignature(2)).unwrap();
        cache.complete(new, scores(0.9));
        cache.complete(old, scores(0.1));
        assert_eq!(cache.scores()[&ItemKey::Feature(1)], 0.1);
        assert!(cache.is_stale(SelectionSignature(2)));
    }
}
