use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use super::builder::{LayoutBuilder, SyncMode};
use super::date_index::GalleryLayout;
use crate::config::MAX_CACHED_LAYOUTS;
use crate::models::DateBucketMap;

/// Key for the layout cache: column count plus content hashes of this pane's
/// buckets and, in synchronized view, the other pane's buckets.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    columns: usize,
    buckets_hash: u64,
    union_hash: Option<u64>,
}

/// Layout cache for built gallery layouts.
///
/// A hit hands back the very same `Arc<GalleryLayout>` as before, so callers
/// can use `Arc::ptr_eq` to decide whether the grid needs re-rendering.
/// Layouts are never mutated; a different input produces a different entry.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, Arc<GalleryLayout>>>,
}

impl LayoutCache {
    /// Creates a new empty layout cache.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHED_LAYOUTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Computes a fast hash of a bucket map.
    ///
    /// Keys are hashed in sorted order so the hash does not depend on map
    /// iteration order, while ids are hashed in their given order because
    /// that order is render order.
    pub fn compute_buckets_hash(buckets: &DateBucketMap) -> u64 {
        let mut keys: Vec<&String> = buckets.keys().collect();
        keys.sort_unstable();

        let mut hasher_input = Vec::with_capacity(buckets.len() * 64);
        for key in keys {
            hasher_input.extend_from_slice(key.as_bytes());
            hasher_input.push(0xff);
            if let Some(ids) = buckets.get(key) {
                for id in ids {
                    hasher_input.extend_from_slice(id.as_bytes());
                    hasher_input.push(0);
                }
            }
            hasher_input.push(0xfe);
        }

        xxh3_64(&hasher_input)
    }

    /// Returns the cached layout for these inputs, building it on a miss.
    ///
    /// O(1) on a hit (plus the hash of the inputs), O(n) on a miss.
    pub fn get_or_build(
        &self,
        builder: &LayoutBuilder,
        buckets: &DateBucketMap,
        columns: usize,
        sync: SyncMode<'_>,
    ) -> Arc<GalleryLayout> {
        let key = CacheKey {
            columns: columns.max(1),
            buckets_hash: Self::compute_buckets_hash(buckets),
            union_hash: match sync {
                SyncMode::Off => None,
                SyncMode::Union(other) => Some(Self::compute_buckets_hash(other)),
            },
        };

        if let Some(layout) = self.cache.lock().get(&key) {
            trace!(columns = key.columns, "Layout cache hit");
            return Arc::clone(layout);
        }

        // Build outside the lock; a concurrent builder of the same key just
        // overwrites with an equal layout.
        let layout = Arc::new(builder.build(buckets, columns, sync));
        self.cache.lock().put(key, Arc::clone(&layout));
        layout
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(entries: &[(&str, &[&str])]) -> DateBucketMap {
        entries
            .iter()
            .map(|(date, ids)| (date.to_string(), ids.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_buckets_hash_consistency() {
        let a = buckets(&[("2024-03-01", &["a", "b"]), ("2024-02-01", &["c"])]);
        let b = buckets(&[("2024-02-01", &["c"]), ("2024-03-01", &["a", "b"])]);
        assert_eq!(
            LayoutCache::compute_buckets_hash(&a),
            LayoutCache::compute_buckets_hash(&b)
        );
    }

    #[test]
    fn test_buckets_hash_changes_on_order() {
        let a = buckets(&[("2024-03-01", &["a", "b"])]);
        let b = buckets(&[("2024-03-01", &["b", "a"])]);
        assert_ne!(
            LayoutCache::compute_buckets_hash(&a),
            LayoutCache::compute_buckets_hash(&b)
        );
    }

    #[test]
    fn test_buckets_hash_changes_on_regrouping() {
        let a = buckets(&[("2024-03-01", &["a", "b"]), ("2024-03-02", &[])]);
        let b = buckets(&[("2024-03-01", &["a"]), ("2024-03-02", &["b"])]);
        assert_ne!(
            LayoutCache::compute_buckets_hash(&a),
            LayoutCache::compute_buckets_hash(&b)
        );
    }

    #[test]
    fn test_cache_hit_returns_same_arc() {
        let cache = LayoutCache::new();
        let builder = LayoutBuilder::new();
        let map = buckets(&[("2024-03-01", &["a", "b", "c"])]);

        let first = cache.get_or_build(&builder, &map, 4, SyncMode::Off);
        let second = cache.get_or_build(&builder, &map, 4, SyncMode::Off);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_column_change_misses() {
        let cache = LayoutCache::new();
        let builder = LayoutBuilder::new();
        let map = buckets(&[("2024-03-01", &["a", "b", "c"])]);

        let four = cache.get_or_build(&builder, &map, 4, SyncMode::Off);
        let six = cache.get_or_build(&builder, &map, 6, SyncMode::Off);
        assert!(!Arc::ptr_eq(&four, &six));
        assert_eq!(six.columns, 6);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_union_change_misses() {
        let cache = LayoutCache::new();
        let builder = LayoutBuilder::new();
        let map = buckets(&[("2024-03-01", &["src-1"])]);
        let other_a = buckets(&[("2024-03-01", &["dst-2"])]);
        let other_b = buckets(&[("2024-02-01", &["dst-3"])]);

        let plain = cache.get_or_build(&builder, &map, 2, SyncMode::Off);
        let a = cache.get_or_build(&builder, &map, 2, SyncMode::Union(&other_a));
        let b = cache.get_or_build(&builder, &map, 2, SyncMode::Union(&other_b));
        assert!(!Arc::ptr_eq(&plain, &a));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = LayoutCache::new();
        let builder = LayoutBuilder::new();
        let map = buckets(&[("2024-03-01", &["a"])]);

        for columns in 1..=(MAX_CACHED_LAYOUTS + 5) {
            cache.get_or_build(&builder, &map, columns, SyncMode::Off);
        }

        assert!(cache.len() <= MAX_CACHED_LAYOUTS);
    }

    #[test]
    fn test_clear() {
        let cache = LayoutCache::new();
        let builder = LayoutBuilder::new();
        cache.get_or_build(&builder, &DateBucketMap::new(), 3, SyncMode::Off);
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
