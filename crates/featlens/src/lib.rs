#![forbid(unsafe_code)]

//! featlens public facade crate.
//!
//! Re-exports the data model, layout solvers, scoring, and tagging state
//! from the internal crates, plus a prelude for day-to-day use. Hosts that
//! only need one layer can depend on that crate directly.

// --- Core re-exports -------------------------------------------------------

pub use featlens_core::{
    BimodalityInfo, Category, CategoryBimodality, CoreError, FeatureId, FeatureTree, GmmComponent,
    Histogram, HistogramKey, HistogramPayload, HistogramStatistics, ItemKey, LinkSpec, NodeSpec,
    PairKey, Point, Rect, SankeyDataset, Size,
};

// --- Layout re-exports -----------------------------------------------------

pub use featlens_layout::{
    HistogramChart, HistogramConfig, LayoutCache, LayoutError, LinearScale, PopoverConfig,
    PopoverPosition, SankeyConfig, SankeyLayout, calculate_optimal_popover_position,
    calculate_sankey_layout, create_histogram_chart, percentile_to_threshold,
};

// --- Score re-exports ------------------------------------------------------

pub use featlens_score::{
    BIMODAL_GATE, BimodalityScore, ScoreLevel, calculate_bimodality_score, get_score_level,
    is_bimodal_score,
};

// --- Tagging re-exports ----------------------------------------------------

pub use featlens_tagging::{
    BoundaryLists, BoundaryThresholds, Commit, CommitHistory, CommitType, ConfigError,
    DashboardConfig, DashboardEvent, DashboardState, DragConfig, Paginator, ScoreMap,
    SelectionMode, SelectionState, SortState, Stage, TagAllStrategy, TagSource, TagState,
    TaggingError,
};

// --- Errors ---------------------------------------------------------------

/// Any featlens failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Tagging(#[from] TaggingError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Standard result type for featlens APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BoundaryThresholds, DashboardConfig, DashboardEvent, DashboardState, Error, FeatureTree,
        HistogramKey, ItemKey, NodeSpec, Result, Stage, TagAllStrategy, TagState,
    };

    pub use crate::{core, layout, score, tagging};
}

pub use featlens_core as core;
pub use featlens_layout as layout;
pub use featlens_score as score;
pub use featlens_tagging as tagging;
