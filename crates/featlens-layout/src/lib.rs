#![forbid(unsafe_code)]

//! Geometric layout engine for featlens.
//!
//! # Role in featlens
//! Everything here is a pure function from data plus container size to pixel
//! geometry: the Sankey diagram of the feature split tree (with right-to-left
//! mirroring and vertical-bar strips), histogram charts with ticks and
//! threshold shading, and popover placement. Nothing is drawn; the embedding
//! view paints the returned rectangles and paths.
//!
//! # Determinism
//! Layout has no hidden state or randomness. [`LayoutCache`] relies on this
//! to memoize results by input fingerprint.

pub mod cache;
pub mod error;
pub mod histogram;
pub mod order;
pub mod popover;
pub mod sankey;
pub mod scale;
pub mod shading;
pub mod validation;
pub mod vertical_bar;

pub use cache::{LayoutCache, LayoutCacheKey, LayoutCacheStats};
pub use error::{LayoutError, Result};
pub use histogram::{
    HistogramBar, HistogramChart, HistogramConfig, Tick, create_histogram_chart,
    create_histogram_chart_with_domain, percentile_to_threshold, threshold_to_percentile,
};
pub use order::{OrderKey, compare_nodes};
pub use popover::{
    Placement, PopoverConfig, PopoverPosition, calculate_optimal_popover_position,
    clamp_to_viewport, place_popover, safe_area,
};
pub use sankey::{
    FlowDirection, LinkPath, PositionedLink, PositionedNode, SankeyConfig, SankeyLayout,
    apply_right_to_left_transform, calculate_sankey_layout,
};
pub use scale::{LinearScale, format_tick, tick_step, ticks};
pub use shading::{BinShade, GradientStop, generate_histogram_shading, threshold_gradient_stops};
pub use validation::{
    MIN_HEIGHT, MIN_WIDTH, validate_dimensions, validate_histogram_data, validate_sankey_data,
};
pub use vertical_bar::{
    FeatureStrip, StripColors, StripState, VerticalBarLayout, calculate_vertical_bar_node_layout,
};
