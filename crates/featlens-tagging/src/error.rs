#![forbid(unsafe_code)]

//! Errors for tagging, commit navigation, and config loading.

use featlens_core::{CoreError, ItemKey};
use featlens_layout::LayoutError;
use thiserror::Error;

use crate::selection::SelectionMode;
use crate::session::Stage;

pub type Result<T> = std::result::Result<T, TaggingError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaggingError {
    #[error("{key} cannot be tagged in {mode:?} mode")]
    WrongMode { key: ItemKey, mode: SelectionMode },

    #[error("bulk tagging needs a bimodality score of at least {gate}, got {score}")]
    NotBimodal { score: f64, gate: f64 },

    #[error("commit index {index} out of range (history holds {len})")]
    CommitOutOfRange { index: usize, len: usize },

    #[error("stage {stage} has not been entered")]
    StageNotEntered { stage: Stage },

    #[error("commit {index} of stage {stage} carries no feature set to revisit")]
    NothingToRevisit { stage: Stage, index: usize },

    #[error("reject threshold {reject} must be finite and not above select threshold {select}")]
    InvalidBoundary { reject: f64, select: f64 },

    #[error("stage {stage} has no reject/select thresholds")]
    NoBoundary { stage: Stage },

    #[error("scores for stage {stage} are stale; request fresh scores first")]
    StaleScores { stage: Stage },

    #[error("no histogram cached for {key}")]
    MissingHistogram { key: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors that can occur when loading a dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config-file")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use featlens_core::PairKey;

    #[test]
    fn messages_name_the_offending_value() {
        let err = TaggingError::WrongMode {
            key: ItemKey::Pair(PairKey::new(1, 2)),
            mode: SelectionMode::Feature,
        };
        assert_eq!(err.to_string(), "1-2 cannot be tagged in Feature mode");

        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }

    #[test]
    fn core_errors_convert() {
        let err: TaggingError = CoreError::not_found("n").into();
        assert_eq!(err.to_string(), "node not found: n");
    }
}
