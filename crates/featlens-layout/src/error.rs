use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Fatal layout failures. The caller renders an empty/error state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("no nodes to lay out")]
    EmptyNodes,

    #[error("{node_count} nodes but no valid links")]
    MissingLinks { node_count: usize },

    #[error("every node has an incoming link; no root to start from")]
    NoRoot,

    #[error("links form a cycle through node {id}")]
    Cycle { id: String },

    #[error("invalid histogram: {reason}")]
    InvalidHistogram { reason: String },
}

impl LayoutError {
    #[must_use]
    pub fn histogram(reason: impl Into<String>) -> Self {
        Self::InvalidHistogram {
            reason: reason.into(),
        }
    }
}
