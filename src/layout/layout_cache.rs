use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::{debug, trace};
use xxhash_rust::xxh3::xxh3_64;

use super::justified::{self, PackConstraints, RowBreak};
use crate::models::{Grid, Item};

/// Default number of cached layouts kept in memory.
pub const MAX_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache, combining container width and list hash.
///
/// Widths are compared bit-for-bit: justified rows fill the usable width
/// exactly, so a layout is only reusable at the very same width.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    width_bits: u64,
    list_hash: u64,
}

impl CacheKey {
    fn new(container_width: f64, list_hash: u64) -> Self {
        Self {
            width_bits: container_width.to_bits(),
            list_hash,
        }
    }
}

/// Cached layout data: the row breaks that can reconstruct the full grid.
#[derive(Debug, Clone)]
struct CachedLayout {
    breaks: Vec<RowBreak>,
    /// Number of items this layout was computed for
    item_count: usize,
    /// Constraints this layout was computed with
    constraints: PackConstraints,
}

/// LRU cache of row breaks keyed by (container width, list hash).
///
/// The list hash covers the aspect ratio of every item in order, so any
/// change to the sequence shape invalidates the entry. Payloads are not
/// hashed; cached breaks are always replayed over the caller's current items.
///
/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct LayoutCache {
    entries: Option<LruCache<CacheKey, CachedLayout>>,
}

impl LayoutCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Computes a fast hash of the item sequence's layout-relevant shape.
    pub fn compute_list_hash<T: Item>(items: &[T]) -> u64 {
        let mut hasher_input = Vec::with_capacity(items.len() * 8);
        for item in items {
            hasher_input.extend_from_slice(&item.aspect_ratio().to_bits().to_le_bytes());
        }
        xxh3_64(&hasher_input)
    }

    /// Retrieves a cached layout, replaying its breaks over `items`.
    ///
    /// Misses when no entry exists for the width, or when the entry was built
    /// for a different item count or different constraints.
    pub fn get<T: Item + Clone>(
        &mut self,
        list_hash: u64,
        items: &[T],
        constraints: &PackConstraints,
    ) -> Option<Grid<T>> {
        let key = CacheKey::new(constraints.container_width, list_hash);
        let entry = self.entries.as_mut()?.get(&key)?;
        if entry.item_count != items.len() || entry.constraints != *constraints {
            return None;
        }
        justified::rows_from_breaks(items, &entry.breaks, constraints)
    }

    /// Peeks at cached breaks without touching the LRU order.
    #[cfg(test)]
    pub fn get_breaks(&self, container_width: f64, list_hash: u64) -> Option<Vec<RowBreak>> {
        let key = CacheKey::new(container_width, list_hash);
        self.entries
            .as_ref()?
            .peek(&key)
            .map(|entry| entry.breaks.clone())
    }

    /// Stores row breaks, evicting the least recently used entry at capacity.
    pub fn set(
        &mut self,
        list_hash: u64,
        breaks: Vec<RowBreak>,
        item_count: usize,
        constraints: &PackConstraints,
    ) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        let key = CacheKey::new(constraints.container_width, list_hash);
        entries.put(
            key,
            CachedLayout {
                breaks,
                item_count,
                constraints: *constraints,
            },
        );
    }

    /// Stores a packed grid by extracting its breaks.
    pub fn set_grid<T>(&mut self, list_hash: u64, grid: &Grid<T>, constraints: &PackConstraints) {
        let breaks = justified::compute_breaks(grid);
        self.set(list_hash, breaks, grid.item_count(), constraints);
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(MAX_CACHE_ENTRIES)
    }
}

/// Full packing with a layout cache in front of it.
#[derive(Debug, Default)]
pub struct CachedLayoutComputer {
    pub cache: LayoutCache,
}

impl CachedLayoutComputer {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LayoutCache::new(capacity),
        }
    }

    /// Packs `items`, reusing cached breaks when the same sequence was packed
    /// at the same width before.
    pub fn compute<T: Item + Clone>(
        &mut self,
        items: &[T],
        constraints: &PackConstraints,
    ) -> Grid<T> {
        if items.is_empty() || !self.cache.is_enabled() {
            return justified::calc_grid(items, constraints);
        }

        let list_hash = LayoutCache::compute_list_hash(items);
        if let Some(grid) = self.cache.get(list_hash, items, constraints) {
            trace!(
                items = items.len(),
                container_width = constraints.container_width,
                "Layout cache hit"
            );
            return grid;
        }

        let grid = justified::calc_grid(items, constraints);
        debug!(
            items = items.len(),
            rows = grid.len(),
            container_width = constraints.container_width,
            "Layout cache miss, packed grid"
        );
        if !grid.is_empty() {
            self.cache.set_grid(list_hash, &grid, constraints);
        }
        grid
    }
}
