#![forbid(unsafe_code)]

//! Outbound events raised for the embedding application.

use std::collections::VecDeque;

use featlens_core::ItemKey;
use serde::{Deserialize, Serialize};

use crate::commit::Commit;
use crate::selection::TagState;
use crate::session::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A node's split thresholds changed.
    ThresholdsUpdated {
        node_id: String,
        thresholds: Vec<f64>,
    },
    /// A node's split was set by percentiles (fractions in `0..=1`).
    ThresholdsUpdatedByPercentile {
        node_id: String,
        percentiles: Vec<f64>,
    },
    /// One item was tagged, re-tagged, or cleared by hand.
    SelectionToggled {
        stage: Stage,
        key: ItemKey,
        state: Option<TagState>,
    },
    CommitCreated { stage: Stage, commit: Commit },
}

/// FIFO of events waiting to be drained by the host.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<DashboardEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DashboardEvent) {
        self.events.push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = DashboardEvent> + '_ {
        self.events.drain(..)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let mut q = EventQueue::new();
        q.push(DashboardEvent::ThresholdsUpdated {
            node_id: "root".into(),
            thresholds: vec![0.5],
        });
        q.push(DashboardEvent::SelectionToggled {
            stage: Stage::Quality,
            key: ItemKey::Feature(3),
            state: None,
        });
        let drained: Vec<_> = q.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], DashboardEvent::ThresholdsUpdated { .. }));
        assert!(q.is_empty());
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = DashboardEvent::ThresholdsUpdatedByPercentile {
            node_id: "n".into(),
            percentiles: vec![0.25],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "thresholds_updated_by_percentile");
        assert_eq!(json["node_id"], "n");
    }
}
