#![forbid(unsafe_code)]

//! Memoization of Sankey layouts.
//!
//! Layout is a pure function of `(dataset, width, height, config)`, so a
//! result can be reused for as long as those inputs are unchanged. The key
//! stores a fingerprint of the dataset and config plus the exact bit
//! patterns of the container size.
//!
//! # Invalidation
//!
//! Resizes need no invalidation since the size is part of the key. Call
//! [`LayoutCache::invalidate_all`] when anything outside the key changes;
//! it bumps a generation counter in O(1) and stale entries are recomputed on
//! next access.
//!
//! # Eviction
//!
//! When full, the least recently used entry is evicted.
//!
//! Errors are never cached.

use std::hash::{Hash, Hasher};

use featlens_core::{SankeyDataset, Sides};
use rustc_hash::{FxHashMap, FxHasher};

use crate::error::Result;
use crate::sankey::{SankeyConfig, SankeyLayout, calculate_sankey_layout};

/// Key for layout cache lookups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LayoutCacheKey {
    pub dataset_hash: u64,
    pub width_bits: u64,
    pub height_bits: u64,
    pub config_hash: u64,
}

impl LayoutCacheKey {
    #[must_use]
    pub fn new(data: &SankeyDataset, width: f64, height: f64, config: &SankeyConfig) -> Self {
        Self {
            dataset_hash: hash_dataset(data),
            width_bits: width.to_bits(),
            height_bits: height.to_bits(),
            config_hash: hash_config(config),
        }
    }
}

fn hash_dataset(data: &SankeyDataset) -> u64 {
    let mut hasher = FxHasher::default();
    data.nodes.len().hash(&mut hasher);
    for node in &data.nodes {
        node.id.hash(&mut hasher);
        node.parent_id.hash(&mut hasher);
        node.stage.hash(&mut hasher);
        node.depth.hash(&mut hasher);
        node.category.hash(&mut hasher);
        node.feature_count.hash(&mut hasher);
        node.branch.hash(&mut hasher);
        node.kind.hash(&mut hasher);
        node.color.hash(&mut hasher);
    }
    data.links.len().hash(&mut hasher);
    for link in &data.links {
        link.source.hash(&mut hasher);
        link.target.hash(&mut hasher);
        link.value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

fn hash_config(config: &SankeyConfig) -> u64 {
    let mut hasher = FxHasher::default();
    let Sides {
        top,
        right,
        bottom,
        left,
    } = config.margin;
    for v in [
        config.node_width,
        config.node_padding,
        config.vertical_bar_expansion,
        config.root_only_height,
        config.two_node_inset,
        top,
        right,
        bottom,
        left,
    ] {
        v.to_bits().hash(&mut hasher);
    }
    config.iterations.hash(&mut hasher);
    hasher.finish()
}

#[derive(Clone, Debug)]
struct CachedLayoutEntry {
    layout: SankeyLayout,
    generation: u64,
    last_used: u64,
}

/// Statistics about layout cache performance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
}

/// Bounded cache of [`SankeyLayout`]s keyed by [`LayoutCacheKey`].
#[derive(Debug)]
pub struct LayoutCache {
    entries: FxHashMap<LayoutCacheKey, CachedLayoutEntry>,
    generation: u64,
    clock: u64,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl LayoutCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(max_entries, Default::default()),
            generation: 0,
            clock: 0,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached layout for `key`, or the result of `compute`. Only `Ok`
    /// results are stored.
    pub fn get_or_compute<F>(&mut self, key: LayoutCacheKey, compute: F) -> Result<SankeyLayout>
    where
        F: FnOnce() -> Result<SankeyLayout>,
    {
        self.clock += 1;
        if let Some(entry) = self.entries.get_mut(&key)
            && entry.generation == self.generation
        {
            self.hits += 1;
            entry.last_used = self.clock;
            return Ok(entry.layout.clone());
        }

        self.misses += 1;
        let layout = compute()?;

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_lru();
        }
        self.entries.insert(
            key,
            CachedLayoutEntry {
                layout: layout.clone(),
                generation: self.generation,
                last_used: self.clock,
            },
        );
        Ok(layout)
    }

    /// [`calculate_sankey_layout`] through the cache.
    pub fn layout(
        &mut self,
        data: &SankeyDataset,
        width: f64,
        height: f64,
        config: &SankeyConfig,
    ) -> Result<SankeyLayout> {
        let key = LayoutCacheKey::new(data, width, height, config);
        self.get_or_compute(key, || calculate_sankey_layout(data, width, height, config))
    }

    /// Mark every entry stale.
    pub fn invalidate_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        tracing::debug!(
            generation = self.generation,
            entries = self.entries.len(),
            "layout_cache.invalidate"
        );
    }

    #[must_use]
    pub fn stats(&self) -> LayoutCacheStats {
        let total = self.hits + self.misses;
        LayoutCacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Drop every entry. Unlike [`invalidate_all`](Self::invalidate_all)
    /// this frees memory immediately.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| *k)
        {
            self.entries.remove(&key);
        }
    }
}

impl Default for LayoutCache {
    /// Capacity of 16 layouts.
    fn default() -> Self {
        Self::new(16)
    }
}
