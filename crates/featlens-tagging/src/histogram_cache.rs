#![forbid(unsafe_code)]

//! Histogram payloads cached per (metric, node).
//!
//! Entries are invalidated per node when thresholds change upstream. A key
//! can be marked loading between request and response; callers use
//! [`HistogramCache::is_loading`] to hold derived views still.

use featlens_core::{HistogramKey, HistogramPayload};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default)]
pub struct HistogramCache {
    entries: FxHashMap<HistogramKey, HistogramPayload>,
    loading: FxHashSet<HistogramKey>,
}

impl HistogramCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &HistogramKey) -> Option<&HistogramPayload> {
        self.entries.get(key)
    }

    /// Store a response and clear its loading mark. Malformed payloads are
    /// stored anyway; chart construction reports them.
    pub fn insert(&mut self, key: HistogramKey, payload: HistogramPayload) {
        if !payload.histogram.is_well_formed() {
            tracing::warn!(
                key = %key,
                bins = payload.histogram.counts.len(),
                edges = payload.histogram.bin_edges.len(),
                "histogram_cache.malformed"
            );
        }
        self.loading.remove(&key);
        self.entries.insert(key, payload);
    }

    pub fn mark_loading(&mut self, key: HistogramKey) {
        self.loading.insert(key);
    }

    /// Clear a loading mark after a failed fetch.
    pub fn cancel_loading(&mut self, key: &HistogramKey) {
        self.loading.remove(key);
    }

    #[must_use]
    pub fn is_loading(&self, key: &HistogramKey) -> bool {
        self.loading.contains(key)
    }

    #[must_use]
    pub fn any_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Drop every metric cached for the given nodes. Returns the number of
    /// entries removed.
    pub fn invalidate_nodes<'a, I>(&mut self, node_ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let doomed: FxHashSet<&str> = node_ids.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|k, _| !doomed.contains(k.node_id.as_str()));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "histogram_cache.invalidate");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.loading.clear();
    }
}
