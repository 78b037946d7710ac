//! Cache capability trait and its implementations.

use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::ttl::TtlTracker;

/// Minimal capability set a cache has to offer.
///
/// Each call is atomic on its own; callers composing several calls get no
/// isolation between them. A `set` may be refused (returns `false`), and a
/// refused or evicted entry simply shows up as a later miss.
pub trait Cache<V>: Send + Sync {
    /// Look up `key`, returning a clone of the cached value.
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Returns `false` if the cache refused the entry.
    fn set(&self, key: &str, value: V, cost: u64) -> bool;

    /// Remove `key` if present.
    fn delete(&self, key: &str);
}

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,

    /// Cost charged against the cache's budget.
    pub cost: u64,

    /// When this entry was inserted.
    pub cached_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, cost: u64) -> Self {
        Self {
            value,
            cost,
            cached_at: Instant::now(),
        }
    }
}

/// Inner state protected by the mutex.
struct CacheInner<V> {
    lru: LruCache<String, CacheEntry<V>>,
    ttl: TtlTracker,
    total_cost: u64,
}

impl<V> CacheInner<V> {
    fn pop(&mut self, key: &str) -> Option<CacheEntry<V>> {
        self.ttl.remove(key);
        let entry = self.lru.pop(key)?;
        self.total_cost -= entry.cost;
        Some(entry)
    }

    fn pop_lru(&mut self) -> Option<String> {
        let (key, entry) = self.lru.pop_lru()?;
        self.ttl.remove(&key);
        self.total_cost -= entry.cost;
        Some(key)
    }
}

/// LRU cache bounded by entry count and total cost, with optional TTL.
///
/// Inserting past either bound evicts least recently used entries until the
/// new one fits. Cloning yields another handle onto the same storage.
pub struct BoundedCache<V> {
    inner: Arc<Mutex<CacheInner<V>>>,
    config: CacheConfig,
}

impl<V: Clone> BoundedCache<V> {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        let inner = CacheInner {
            lru: LruCache::unbounded(),
            ttl: TtlTracker::new(config.ttl),
            total_cost: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current number of entries (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Check for `key` without updating LRU order or TTL.
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.lock();
        inner.lru.contains(key) && !inner.ttl.is_expired(key)
    }

    /// Read a value without updating LRU order or TTL.
    pub fn peek(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock();
        if inner.ttl.is_expired(key) {
            None
        } else {
            inner.lru.peek(key).map(|e| e.value.clone())
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let expired = inner.ttl.drain_expired();
        let mut count = 0;
        for key in expired {
            if let Some(entry) = inner.lru.pop(&key) {
                inner.total_cost -= entry.cost;
                count += 1;
            }
        }

        if count > 0 {
            debug!(count, "Cleaned up expired cache entries");
        }
        count
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.lru.clear();
        inner.ttl.clear();
        inner.total_cost = 0;
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.lru.len(),
            capacity: self.config.max_entries,
            total_cost: inner.total_cost,
            max_cost: self.config.max_cost,
        }
    }
}

impl<V: Clone + Send + 'static> Cache<V> for BoundedCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        if inner.ttl.is_expired(key) {
            if inner.pop(key).is_some() {
                debug!(key, "Cache entry expired");
            }
            return None;
        }

        let value = inner.lru.get(key).map(|e| e.value.clone())?;
        inner.ttl.touch(key.to_string());
        trace!(key, "Cache hit");
        Some(value)
    }

    fn set(&self, key: &str, value: V, cost: u64) -> bool {
        if cost > self.config.max_cost || self.config.max_entries == 0 {
            debug!(key, cost, max_cost = self.config.max_cost, "Cache entry rejected");
            return false;
        }

        let mut inner = self.inner.lock();
        inner.pop(key);

        while inner.lru.len() >= self.config.max_entries
            || inner.total_cost + cost > self.config.max_cost
        {
            match inner.pop_lru() {
                Some(evicted) => debug!(key = %evicted, "Evicting LRU cache entry to make room"),
                None => break,
            }
        }

        inner.lru.put(key.to_string(), CacheEntry::new(value, cost));
        inner.ttl.touch(key.to_string());
        inner.total_cost += cost;

        trace!(key, cost, cache_size = inner.lru.len(), "Cache entry stored");
        true
    }

    fn delete(&self, key: &str) {
        if self.inner.lock().pop(key).is_some() {
            trace!(key, "Cache entry deleted");
        }
    }
}

impl<V> Clone for BoundedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

/// A cache that stores nothing. Every `get` misses and every `set` is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<V> Cache<V> for NoCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn set(&self, _key: &str, _value: V, _cost: u64) -> bool {
        false
    }

    fn delete(&self, _key: &str) {}
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum number of entries.
    pub capacity: usize,

    /// Summed cost of current entries.
    pub total_cost: u64,

    /// Cost budget.
    pub max_cost: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache_with(config: CacheConfig) -> BoundedCache<Vec<u32>> {
        BoundedCache::new(config)
    }

    #[test]
    fn test_set_and_get() {
        let cache = cache_with(CacheConfig::new().with_max_entries(10));

        assert!(cache.set("alice", vec![1, 2, 3], 1));
        assert_eq!(cache.get("alice"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("bob"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = cache_with(CacheConfig::new());

        cache.set("alice", vec![1], 1);
        cache.set("alice", vec![1, 2], 1);

        assert_eq!(cache.get("alice"), Some(vec![1, 2]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().total_cost, 1);
    }

    #[test]
    fn test_delete() {
        let cache = cache_with(CacheConfig::new());
        cache.set("alice", vec![1], 1);

        cache.delete("alice");
        cache.delete("never-there");

        assert!(cache.get("alice").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_cost, 0);
    }

    #[test]
    fn test_lru_eviction_by_count() {
        let cache = cache_with(CacheConfig::new().with_max_entries(3));

        for i in 1..=3 {
            cache.set(&format!("user-{}", i), vec![i], 1);
        }
        cache.set("user-4", vec![4], 1);

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("user-1"));
        assert!(cache.contains("user-2"));
        assert!(cache.contains("user-4"));
    }

    #[test]
    fn test_get_updates_lru_order() {
        let cache = cache_with(CacheConfig::new().with_max_entries(3));

        for i in 1..=3 {
            cache.set(&format!("user-{}", i), vec![i], 1);
        }

        // user-1 becomes most recently used, so user-2 is evicted next
        let _ = cache.get("user-1");
        cache.set("user-4", vec![4], 1);

        assert!(cache.contains("user-1"));
        assert!(!cache.contains("user-2"));
        assert!(cache.contains("user-3"));
    }

    #[test]
    fn test_cost_budget_evicts() {
        let cache = cache_with(CacheConfig::new().with_max_cost(10));

        cache.set("a", vec![], 4);
        cache.set("b", vec![], 4);
        cache.set("c", vec![], 4);

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().total_cost, 8);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let cache = cache_with(CacheConfig::new().with_max_cost(5));
        cache.set("small", vec![1], 1);

        assert!(!cache.set("huge", vec![2], 6));
        assert!(cache.get("huge").is_none());
        assert!(cache.contains("small"));
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = cache_with(CacheConfig::new().with_ttl(Duration::from_millis(20)));
        cache.set("alice", vec![1], 1);
        assert!(cache.contains("alice"));

        std::thread::sleep(Duration::from_millis(40));

        assert!(!cache.contains("alice"));
        assert!(cache.get("alice").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let cache = cache_with(CacheConfig::new().with_ttl(Duration::from_millis(20)));
        for i in 1..=3 {
            cache.set(&format!("user-{}", i), vec![i], 1);
        }

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.cleanup_expired(), 3);
        assert_eq!(cache.stats().total_cost, 0);
    }

    #[test]
    fn test_clone_shares_storage() {
        let cache = cache_with(CacheConfig::new());
        let other = cache.clone();
        cache.set("alice", vec![7], 1);

        assert_eq!(other.peek("alice"), Some(vec![7]));
    }

    #[test]
    fn test_no_cache_never_stores() {
        let cache = NoCache;
        assert!(!Cache::<Vec<u32>>::set(&cache, "alice", vec![1], 1));
        assert_eq!(Cache::<Vec<u32>>::get(&cache, "alice"), None);
    }

    #[tokio::test]
    async fn test_concurrent_sets_from_tasks() {
        let cache = cache_with(CacheConfig::new());
        let mut handles = Vec::new();
        for i in 0..8u32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.set(&format!("user-{}", i), vec![i], 1)
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(cache.len(), 8);
    }
}
