use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid pair key: {key:?} (expected \"<main>-<similar>\")")]
    InvalidPairKey { key: String },

    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    #[error("duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("thresholds must be finite and strictly increasing: {thresholds:?}")]
    InvalidThresholds { thresholds: Vec<f64> },

    #[error("feature tree is invalid: {}", violations.join("; "))]
    InvalidTree { violations: Vec<String> },
}

impl CoreError {
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn invalid_tree_joins_violations() {
        let error = CoreError::InvalidTree {
            violations: vec!["no root".into(), "cycle".into()],
        };
        assert_eq!(error.to_string(), "feature tree is invalid: no root; cycle");
    }
}
