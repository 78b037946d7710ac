//! In-process caching primitives.
//!
//! This crate provides the caching layer the user directory sits on:
//! - A [`Cache`] capability trait (`get` / `set` / `delete`)
//! - [`BoundedCache`], an LRU bounded by entry count and total cost
//! - [`NoCache`], a stub that never stores anything
//! - [`TtlTracker`] for optional time-based expiry
//!
//! # Example
//!
//! ```rust,ignore
//! use ispend_cache::{BoundedCache, Cache, CacheConfig};
//!
//! let config = CacheConfig::default()
//!     .with_max_entries(1000)
//!     .with_ttl(Duration::from_secs(3600));
//!
//! let cache: BoundedCache<Vec<u8>> = BoundedCache::new(config);
//! cache.set("key", vec![1, 2, 3], 1);
//! ```

mod cache;
mod config;
mod ttl;

pub use cache::{BoundedCache, Cache, CacheEntry, CacheStats, NoCache};
pub use config::CacheConfig;
pub use ttl::TtlTracker;
