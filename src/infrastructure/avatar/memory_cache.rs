//! In-memory LRU avatar cache bounded by entry count and total cost.

use std::sync::Arc;

use lru::LruCache;
use tracing::{debug, trace};

use crate::domain::entities::AvatarKey;

/// Default maximum number of cached avatars.
pub const DEFAULT_COUNT_LIMIT: usize = 5;

/// Default maximum total cost (decoded bytes) of cached avatars.
pub const DEFAULT_TOTAL_COST_LIMIT: usize = 10 * 1024 * 1024;

struct CacheEntry {
    image: Arc<image::DynamicImage>,
    cost: usize,
}

/// In-memory cache for decoded avatars.
///
/// Owned by a single loader, so it needs no locking. A limit of `0` disables
/// that bound. Least recently used entries are evicted first.
pub struct MemoryAvatarCache {
    entries: LruCache<AvatarKey, CacheEntry>,
    count_limit: usize,
    total_cost_limit: usize,
    total_cost: usize,
    hits: u64,
    misses: u64,
}

impl MemoryAvatarCache {
    /// Creates a new cache with the given limits.
    #[must_use]
    pub fn new(count_limit: usize, total_cost_limit: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            count_limit,
            total_cost_limit,
            total_cost: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Cost charged for an image: its decoded size in bytes.
    #[must_use]
    pub fn cost_of(image: &image::DynamicImage) -> usize {
        image.as_bytes().len()
    }

    /// Gets an image and marks it as recently used.
    pub fn get(&mut self, key: &AvatarKey) -> Option<Arc<image::DynamicImage>> {
        if let Some(entry) = self.entries.get(key) {
            self.hits += 1;
            trace!(key = %key, "Memory cache hit");
            Some(entry.image.clone())
        } else {
            self.misses += 1;
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    /// Peeks at an image without promoting it or touching statistics.
    #[must_use]
    pub fn peek(&self, key: &AvatarKey) -> Option<Arc<image::DynamicImage>> {
        self.entries.peek(key).map(|entry| entry.image.clone())
    }

    /// Returns true if `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &AvatarKey) -> bool {
        self.entries.contains(key)
    }

    /// Stores an image, then evicts until both limits hold.
    ///
    /// Returns false if the image itself had to be evicted because it alone
    /// exceeds the cost limit.
    pub fn put(&mut self, key: AvatarKey, image: Arc<image::DynamicImage>) -> bool {
        let cost = Self::cost_of(&image);
        debug!(key = %key, cost, "Storing avatar in memory cache");

        if let Some(previous) = self.entries.put(key.clone(), CacheEntry { image, cost }) {
            self.total_cost -= previous.cost;
        }
        self.total_cost += cost;

        self.enforce_limits();
        self.contains(&key)
    }

    /// Removes every image.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_cost = 0;
        debug!("Cleared memory avatar cache");
    }

    /// Returns the number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the summed cost of all cached images.
    #[must_use]
    pub const fn total_cost(&self) -> usize {
        self.total_cost
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            size: self.len(),
            total_cost: self.total_cost(),
        }
    }

    fn over_limits(&self) -> bool {
        (self.count_limit > 0 && self.entries.len() > self.count_limit)
            || (self.total_cost_limit > 0 && self.total_cost > self.total_cost_limit)
    }

    fn enforce_limits(&mut self) {
        while self.over_limits() {
            let Some((key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.total_cost -= entry.cost;
            debug!(key = %key, "Evicted least recently used avatar");
        }
    }
}

impl Default for MemoryAvatarCache {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT_LIMIT, DEFAULT_TOTAL_COST_LIMIT)
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub size: usize,
    /// Summed decoded size of cached images in bytes.
    pub total_cost: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {} KiB, {:.1}% hit rate ({} hits, {} misses)",
            self.size,
            self.total_cost / 1024,
            self.hit_rate,
            self.hits,
            self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(side: u32) -> Arc<image::DynamicImage> {
        Arc::new(image::DynamicImage::new_rgb8(side, side))
    }

    #[test]
    fn test_cache_put_and_get() {
        let mut cache = MemoryAvatarCache::new(10, 0);
        let key = AvatarKey::new("https://example.com/a.png");

        assert!(cache.put(key.clone(), rgb(100)));
        let retrieved = cache.get(&key);

        assert_eq!(retrieved.map(|img| img.width()), Some(100));
        assert_eq!(cache.total_cost(), 100 * 100 * 3);
    }

    #[test]
    fn test_count_limit_evicts_lru() {
        let mut cache = MemoryAvatarCache::new(2, 0);
        let k1 = AvatarKey::new("k1");
        let k2 = AvatarKey::new("k2");
        let k3 = AvatarKey::new("k3");

        cache.put(k1.clone(), rgb(10));
        cache.put(k2.clone(), rgb(10));
        // Touch k1 so k2 becomes the eviction candidate.
        let _ = cache.get(&k1);
        cache.put(k3.clone(), rgb(10));

        assert!(cache.contains(&k1));
        assert!(!cache.contains(&k2));
        assert!(cache.contains(&k3));
        assert_eq!(cache.total_cost(), 2 * 10 * 10 * 3);
    }

    #[test]
    fn test_cost_limit_evicts_until_within_budget() {
        // Each 10x10 RGB image costs 300 bytes.
        let mut cache = MemoryAvatarCache::new(0, 700);

        cache.put(AvatarKey::new("a"), rgb(10));
        cache.put(AvatarKey::new("b"), rgb(10));
        cache.put(AvatarKey::new("c"), rgb(10));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&AvatarKey::new("a")));
        assert!(cache.total_cost() <= 700);
    }

    #[test]
    fn test_oversized_entry_is_not_retained() {
        let mut cache = MemoryAvatarCache::new(0, 100);
        assert!(!cache.put(AvatarKey::new("big"), rgb(10)));
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
    }

    #[test]
    fn test_replacing_key_updates_cost() {
        let mut cache = MemoryAvatarCache::new(0, 0);
        let key = AvatarKey::new("same");

        cache.put(key.clone(), rgb(10));
        cache.put(key.clone(), rgb(20));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_cost(), 20 * 20 * 3);
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = MemoryAvatarCache::default();
        let key = AvatarKey::new("k");
        cache.put(key.clone(), rgb(10));

        let _ = cache.get(&key);
        let _ = cache.get(&AvatarKey::new("missing"));
        let _ = cache.peek(&key);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_drops_entries_and_cost() {
        let mut cache = MemoryAvatarCache::default();
        cache.put(AvatarKey::new("k"), rgb(10));
        cache.put(AvatarKey::new("other"), rgb(10));
        assert_eq!(cache.total_cost(), 600);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
    }
}
