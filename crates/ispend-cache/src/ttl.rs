//! Last-access tracking for TTL-based expiry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Tracks when each key was last touched and answers whether it outlived
/// the configured TTL.
///
/// With no TTL nothing ever expires, so callers can hold a tracker
/// unconditionally and let configuration decide.
#[derive(Debug)]
pub struct TtlTracker<K = String> {
    last_access: HashMap<K, Instant>,
    ttl: Option<Duration>,
}

impl<K: Hash + Eq + Clone> TtlTracker<K> {
    /// Create a tracker with the given TTL.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            last_access: HashMap::new(),
            ttl,
        }
    }

    /// Record an access now, restarting the key's TTL.
    pub fn touch(&mut self, key: K) {
        self.last_access.insert(key, Instant::now());
    }

    /// Whether `key` has expired.
    ///
    /// An untracked key counts as expired once a TTL is configured.
    pub fn is_expired<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(ttl) = self.ttl else {
            return false;
        };
        match self.last_access.get(key) {
            None => true,
            Some(at) => at.elapsed() > ttl,
        }
    }

    /// Stop tracking `key`.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.last_access.remove(key);
    }

    /// Remove every expired key and return them.
    pub fn drain_expired(&mut self) -> Vec<K> {
        let Some(ttl) = self.ttl else {
            return Vec::new();
        };
        let now = Instant::now();
        let expired: Vec<K> = self
            .last_access
            .iter()
            .filter(|(_, at)| now.duration_since(**at) > ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.last_access.remove(key);
        }
        expired
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.last_access.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.last_access.is_empty()
    }

    /// Forget every key.
    pub fn clear(&mut self) {
        self.last_access.clear();
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}
