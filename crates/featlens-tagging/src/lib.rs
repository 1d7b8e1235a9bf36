#![forbid(unsafe_code)]

//! Tagging state and interaction controllers for featlens.
//!
//! # Role in featlens
//! This crate holds everything the labeling dashboard mutates: per-item
//! selection tags with their provenance, the bounded commit history of each
//! stage, score staleness tracking, boundary previews, table sort and
//! paging, and pointer-drag controllers. [`DashboardState`] ties them
//! together and queues [`DashboardEvent`]s for the embedding application.
//!
//! # Data flow
//! ```text
//! user edit ──► SelectionState ──► SelectionSignature ──► ScoreCache
//!                    │                                        │
//!                    ▼                                        ▼
//!              CommitHistory ◄── Apply / Tag All ◄── fresh scores only
//! ```
//!
//! Nothing here performs I/O except the optional `config-file` loaders.

pub mod boundary;
pub mod commit;
pub mod config;
pub mod drag;
pub mod error;
pub mod events;
pub mod histogram_cache;
pub mod list;
pub mod pagination;
pub mod selection;
pub mod session;
pub mod staleness;

pub use boundary::{
    BoundaryItem, BoundaryLists, BoundaryPreview, BoundaryThresholds, classify_boundary_items,
};
pub use commit::{Commit, CommitHistory, CommitType, HistoryConfig};
pub use config::{DashboardConfig, TaggingConfig};
pub use drag::{DragConfig, PopoverDrag, RectSelection, ThresholdDrag};
pub use error::{ConfigError, Result, TaggingError};
pub use events::{DashboardEvent, EventQueue};
pub use histogram_cache::HistogramCache;
pub use list::{
    NullsPlacement, SortDirection, SortMode, SortState, sort_by_decision_margin, sort_by_field,
};
pub use pagination::Paginator;
pub use selection::{
    ApplyOutcome, ScoreMap, SelectionCounts, SelectionMode, SelectionSnapshot, SelectionState,
    Tag, TagAllOutcome, TagAllStrategy, TagSource, TagState,
};
pub use session::{DashboardState, Stage, StageState};
pub use staleness::{ScoreCache, ScoreRequest, SelectionSignature};
