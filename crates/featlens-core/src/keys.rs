#![forbid(unsafe_code)]

//! Composite keys for features, pairs, and cached histogram payloads.
//!
//! Keys are structural types rather than concatenated strings, so a metric
//! name containing `:` or a pair of ids containing `-` can never collide.
//! The string forms (`"12-34"` for pairs) exist only at the wire boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Integer identifier of one feature.
pub type FeatureId = u32;

/// Ordered pair of features compared for redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    /// The feature the pair was discovered from.
    pub main: FeatureId,
    /// The similar feature.
    pub similar: FeatureId,
}

impl PairKey {
    #[must_use]
    pub const fn new(main: FeatureId, similar: FeatureId) -> Self {
        Self { main, similar }
    }

    /// Both feature ids of the pair.
    #[must_use]
    pub const fn features(&self) -> [FeatureId; 2] {
        [self.main, self.similar]
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.main, self.similar)
    }
}

impl FromStr for PairKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidPairKey { key: s.to_string() };
        let (main, similar) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            main: main.trim().parse().map_err(|_| invalid())?,
            similar: similar.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Key of one taggable item: a pair (feature splitting) or a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKey {
    Pair(PairKey),
    Feature(FeatureId),
}

impl ItemKey {
    /// Feature ids touched by this item.
    pub fn feature_ids(&self) -> impl Iterator<Item = FeatureId> {
        let ids: [Option<FeatureId>; 2] = match self {
            Self::Pair(p) => [Some(p.main), Some(p.similar)],
            Self::Feature(id) => [Some(*id), None],
        };
        ids.into_iter().flatten()
    }

    #[must_use]
    pub fn as_pair(&self) -> Option<PairKey> {
        match self {
            Self::Pair(p) => Some(*p),
            Self::Feature(_) => None,
        }
    }

    #[must_use]
    pub fn as_feature(&self) -> Option<FeatureId> {
        match self {
            Self::Feature(id) => Some(*id),
            Self::Pair(_) => None,
        }
    }
}

impl From<PairKey> for ItemKey {
    fn from(p: PairKey) -> Self {
        Self::Pair(p)
    }
}

impl From<FeatureId> for ItemKey {
    fn from(id: FeatureId) -> Self {
        Self::Feature(id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair(p) => p.fmt(f),
            Self::Feature(id) => id.fmt(f),
        }
    }
}

/// Cache key for histogram payloads, fetched per (metric, node).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HistogramKey {
    pub metric: String,
    pub node_id: String,
}

impl HistogramKey {
    #[must_use]
    pub fn new(metric: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            node_id: node_id.into(),
        }
    }
}

impl fmt::Display for HistogramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.metric, self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_round_trips_through_wire_form() {
        let key = PairKey::new(12, 34);
        assert_eq!(key.to_string(), "12-34");
        assert_eq!("12-34".parse::<PairKey>().unwrap(), key);
    }

    #[test]
    fn pair_key_rejects_garbage() {
        assert!("12".parse::<PairKey>().is_err());
        assert!("a-b".parse::<PairKey>().is_err());
        assert!("1-2-3".parse::<PairKey>().is_err());
    }

    #[test]
    fn item_key_feature_ids() {
        let pair = ItemKey::Pair(PairKey::new(3, 9));
        assert_eq!(pair.feature_ids().collect::<Vec<_>>(), vec![3, 9]);
        let single = ItemKey::Feature(5);
        assert_eq!(single.feature_ids().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn histogram_keys_do_not_collide_on_separator() {
        let a = HistogramKey::new("a:b", "c");
        let b = HistogramKey::new("a", "b:c");
        assert_ne!(a, b);
    }
}
