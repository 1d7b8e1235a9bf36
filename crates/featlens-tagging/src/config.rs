#![forbid(unsafe_code)]

//! Dashboard configuration as data.
//!
//! [`DashboardConfig`] groups every tunable of the layout and tagging
//! components. With the `config-file` feature it loads from TOML or JSON;
//! missing sections and fields fall back to their defaults.
//!
//! ```toml
//! [sankey]
//! node_width = 18.0
//!
//! [history]
//! max_commits = 20
//!
//! [tagging]
//! bimodal_gate = 0.8
//! ```
//!
//! ```rust,ignore
//! let config = DashboardConfig::from_toml_file("featlens.toml")?;
//! ```

#[cfg(feature = "config-file")]
use std::path::Path;

use featlens_layout::{HistogramConfig, PopoverConfig, SankeyConfig};
use featlens_score::BIMODAL_GATE;
use serde::{Deserialize, Serialize};

use crate::commit::HistoryConfig;
use crate::drag::DragConfig;
#[cfg(feature = "config-file")]
use crate::error::ConfigError;
use crate::list::SortState;

// ---------------------------------------------------------------------------
// TaggingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Bimodality score that unlocks Tag All. Default: 0.83.
    pub bimodal_gate: f64,
    /// Rows per table page. Default: 10.
    pub page_size: usize,
    /// Initial sort of every table.
    pub sort: SortState,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            bimodal_gate: BIMODAL_GATE,
            page_size: 10,
            sort: SortState::default(),
        }
    }
}

impl TaggingConfig {
    #[must_use]
    pub fn bimodal_gate(mut self, gate: f64) -> Self {
        self.bimodal_gate = gate;
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub sankey: SankeyConfig,
    pub histogram: HistogramConfig,
    pub popover: PopoverConfig,
    pub history: HistoryConfig,
    pub tagging: TaggingConfig,
    pub drag: DragConfig,
}

impl DashboardConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Every out-of-range parameter. Empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.sankey.node_width > 0.0) {
            errors.push(format!(
                "sankey.node_width must be > 0, got {}",
                self.sankey.node_width
            ));
        }
        if !(self.sankey.node_padding >= 0.0) {
            errors.push(format!(
                "sankey.node_padding must be >= 0, got {}",
                self.sankey.node_padding
            ));
        }
        if !(self.sankey.vertical_bar_expansion >= 1.0) {
            errors.push(format!(
                "sankey.vertical_bar_expansion must be >= 1, got {}",
                self.sankey.vertical_bar_expansion
            ));
        }
        if self.histogram.tick_count == 0 {
            errors.push("histogram.tick_count must be > 0".into());
        }
        if !(self.popover.margin >= 0.0) {
            errors.push(format!(
                "popover.margin must be >= 0, got {}",
                self.popover.margin
            ));
        }
        if self.history.max_commits < 2 {
            errors.push(format!(
                "history.max_commits must be >= 2, got {}",
                self.history.max_commits
            ));
        }
        if !(0.0..=1.0).contains(&self.tagging.bimodal_gate) {
            errors.push(format!(
                "tagging.bimodal_gate must be in [0, 1], got {}",
                self.tagging.bimodal_gate
            ));
        }
        if self.tagging.page_size == 0 {
            errors.push("tagging.page_size must be > 0".into());
        }
        if !(self.drag.drag_threshold >= 0.0) {
            errors.push(format!(
                "drag.drag_threshold must be >= 0, got {}",
                self.drag.drag_threshold
            ));
        }
        if !(0.0..0.5).contains(&self.drag.min_handle_gap) {
            errors.push(format!(
                "drag.min_handle_gap must be in [0, 0.5), got {}",
                self.drag.min_handle_gap
            ));
        }

        errors
    }
}
