#![forbid(unsafe_code)]

//! Capped commit history with a movable cursor.
//!
//! [`CommitHistory`] stores full [`SelectionSnapshot`]s. Creating a commit
//! appends and moves the cursor to it; clicking an older commit first saves
//! the live state over the commit at the cursor, then restores the clicked
//! one.
//!
//! ```text
//! create_commit(Apply) x3, max_commits = 3
//! ┌───────────────────────────────────────────┐
//! │ [#0 initial] [#2 apply] [#3 apply]        │  #1 evicted, #0 kept
//! │ cursor ──────────────────────^            │
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. `commits[0]` is always the initial commit with id 0.
//! 2. `len() <= config.max_commits` after every operation.
//! 3. Commit ids strictly increase along the history.
//! 4. `cursor() < len()`.
//!
//! # Failure Modes
//!
//! - Out-of-range indices return [`TaggingError::CommitOutOfRange`] and leave
//!   both the history and the live selection untouched.

use featlens_core::FeatureId;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggingError};
use crate::selection::{SelectionCounts, SelectionSnapshot, SelectionState};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitType {
    /// Created on stage entry.
    Initial,
    /// Created by Apply Threshold.
    Apply,
    /// Created by Tag All.
    TagAll,
}

/// One stored snapshot of tagging state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: u64,
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub snapshot: SelectionSnapshot,
    /// Tallies at commit time, for tooltips.
    pub counts: Option<SelectionCounts>,
    /// Working feature set at commit time, for revisiting a stage.
    pub feature_ids: Option<Vec<FeatureId>>,
}

/// Configuration for the commit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum commits retained, including the initial one. Values below 2
    /// are raised to 2.
    pub max_commits: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_commits: 10 }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_commits: usize) -> Self {
        Self { max_commits }
    }

    #[must_use]
    pub fn max_commits(mut self, max: usize) -> Self {
        self.max_commits = max;
        self
    }

    fn cap(&self) -> usize {
        self.max_commits.max(2)
    }
}

// ============================================================================
// CommitHistory
// ============================================================================

#[derive(Debug, Clone)]
pub struct CommitHistory {
    commits: Vec<Commit>,
    cursor: usize,
    next_id: u64,
    config: HistoryConfig,
}

impl CommitHistory {
    /// Start a history whose initial commit captures `selection`.
    #[must_use]
    pub fn new(
        config: HistoryConfig,
        selection: &SelectionState,
        feature_ids: Option<Vec<FeatureId>>,
    ) -> Self {
        let initial = Commit {
            id: 0,
            commit_type: CommitType::Initial,
            snapshot: selection.snapshot(),
            counts: Some(selection.counts()),
            feature_ids,
        };
        Self {
            commits: vec![initial],
            cursor: 0,
            next_id: 1,
            config,
        }
    }

    // ====================================================================
    // Core Operations
    // ====================================================================

    /// Overwrite the commit at the cursor with the live state, so scratch
    /// edits survive navigating away.
    pub fn save_current_state(&mut self, selection: &SelectionState) {
        if let Some(commit) = self.commits.get_mut(self.cursor) {
            commit.snapshot = selection.snapshot();
            commit.counts = Some(selection.counts());
        }
    }

    /// Append a snapshot of `selection` and move the cursor to it.
    pub fn create_commit(
        &mut self,
        commit_type: CommitType,
        selection: &SelectionState,
        feature_ids: Option<Vec<FeatureId>>,
    ) -> &Commit {
        let id = self.next_id;
        self.next_id += 1;
        self.commits.push(Commit {
            id,
            commit_type,
            snapshot: selection.snapshot(),
            counts: Some(selection.counts()),
            feature_ids,
        });
        let evicted = self.enforce_cap();
        self.cursor = self.commits.len() - 1;
        tracing::debug!(
            id,
            ?commit_type,
            len = self.commits.len(),
            evicted,
            "commit.create"
        );
        &self.commits[self.cursor]
    }

    /// Replace `selection` with the commit at `index` and move the cursor.
    pub fn restore_commit(&mut self, index: usize, selection: &mut SelectionState) -> Result<&Commit> {
        self.check_index(index)?;
        selection.restore(&self.commits[index].snapshot);
        self.cursor = index;
        tracing::debug!(index, id = self.commits[index].id, "commit.restore");
        Ok(&self.commits[index])
    }

    /// Save the live state at the cursor, then restore `index`.
    pub fn handle_commit_click(
        &mut self,
        index: usize,
        selection: &mut SelectionState,
    ) -> Result<&Commit> {
        self.check_index(index)?;
        self.save_current_state(selection);
        self.restore_commit(index, selection)
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Commit> {
        self.commits.get(index)
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Commit under the cursor.
    #[must_use]
    pub fn current(&self) -> &Commit {
        &self.commits[self.cursor]
    }

    #[must_use]
    pub fn initial(&self) -> &Commit {
        &self.commits[0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Always false; the initial commit is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ====================================================================
    // Maintenance
    // ====================================================================

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.commits.len() {
            Ok(())
        } else {
            Err(TaggingError::CommitOutOfRange {
                index,
                len: self.commits.len(),
            })
        }
    }

    /// Evict the oldest commits after the initial one until under the cap.
    fn enforce_cap(&mut self) -> usize {
        let mut evicted = 0;
        while self.commits.len() > self.config.cap() {
            self.commits.remove(1);
            evicted += 1;
        }
        evicted
    }
}
