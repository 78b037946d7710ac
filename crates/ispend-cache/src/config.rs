//! Configuration for the bounded cache.

use std::time::Duration;

/// Default maximum number of cached entries.
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Default total cost budget. With the directory's cost of 1 per entry this
/// is effectively unbounded; `max_entries` does the limiting.
pub const DEFAULT_MAX_COST: u64 = 1 << 30;

/// Default TTL for entries (none - entries don't expire).
pub const DEFAULT_TTL: Option<Duration> = None;

/// Configuration for [`crate::BoundedCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,

    /// Maximum summed cost of all entries before LRU eviction.
    /// A single entry costing more than this is rejected.
    pub max_cost: u64,

    /// Optional time-to-live for cached entries.
    /// Entries that haven't been accessed within this duration are dropped.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_cost: DEFAULT_MAX_COST,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the total cost budget.
    pub fn with_max_cost(mut self, max: u64) -> Self {
        self.max_cost = max;
        self
    }

    /// Set the TTL for cached entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Disable TTL (entries don't expire based on time).
    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }
}
