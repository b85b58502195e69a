//! Cache Store Module
//!
//! Bounded cache with insertion-age eviction and TTL expiration, built on a
//! sharded concurrent map so readers and writers never take a global lock.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats};

// == TTL Cache ==
/// Concurrent key-value cache with a fixed capacity and a fixed TTL.
///
/// When a new key arrives at capacity, the entry with the earliest creation
/// time is evicted. Reads never refresh an entry, so this is not an LRU.
///
/// The size check and the insert in [`TtlCache::put`] are not one atomic
/// step. Concurrent writers may briefly push the size past capacity; the next
/// insert of a new key evicts back down to the bound.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: DashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: StatsCounters,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Age after which an entry is stale
    ttl: Duration,
    /// Makes the next sweep panic, to exercise fault handling in callers
    #[cfg(test)]
    fail_next_sweep: std::sync::atomic::AtomicBool,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates a new cache with specified capacity and TTL.
    ///
    /// A capacity of zero is not a supported configuration.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            stats: StatsCounters::default(),
            capacity,
            ttl,
            #[cfg(test)]
            fail_next_sweep: std::sync::atomic::AtomicBool::new(false),
        }
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Replacing an existing key never evicts. Inserting a new key while the
    /// cache is full first evicts the oldest entry by creation time.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value));
        debug!(key = %key, "cache put");
    }

    // == Get ==
    /// Returns the stored value if present and not expired.
    ///
    /// An expired entry counts as a miss and is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(self.ttl, now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return None;
            }
        };

        match value {
            Some(value) => {
                self.stats.record_hit();
                debug!(key, "cache hit");
                Some(value)
            }
            None => {
                // A concurrent put may have replaced the stale entry already.
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired_at(self.ttl, now))
                    .is_some()
                {
                    self.stats.record_expirations(1);
                }
                self.stats.record_miss();
                debug!(key, "cache entry expired");
                None
            }
        }
    }

    // == Invalidate ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!(key, "cache key invalidated");
        }
        removed
    }

    // == Invalidate By Prefix ==
    /// Removes every key starting with `prefix`. Returns the number removed.
    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.starts_with(prefix) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            debug!(prefix, removed, "cache prefix invalidated");
        }
        removed
    }

    // == Sweep ==
    /// Removes all expired entries regardless of access.
    ///
    /// Returns the number of entries removed. An entry whose age cannot be
    /// evaluated is logged and kept; the sweep continues over the rest.
    pub fn sweep(&self) -> usize {
        self.take_requested_sweep_failure();

        let now = Instant::now();
        let ttl = self.ttl;
        let mut removed = 0;

        self.entries.retain(|key, entry| match entry.age_at(now) {
            Some(age) if age > ttl => {
                debug!(key = %key, age_ms = age.as_millis() as u64, "sweeping expired entry");
                removed += 1;
                false
            }
            Some(_) => true,
            None => {
                // Written by a put that raced this sweep
                debug!(key = %key, "cache entry is newer than the sweep clock, skipping");
                true
            }
        });

        self.stats.record_expirations(removed);
        removed
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a snapshot of the stored keys, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns true if `key` is stored, without checking expiry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    #[cfg(not(test))]
    fn take_requested_sweep_failure(&self) {}

    #[cfg(test)]
    fn take_requested_sweep_failure(&self) {
        if self
            .fail_next_sweep
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            panic!("sweep failure requested by test");
        }
    }

    /// Evicts the entry with the earliest creation time.
    ///
    /// Returns false when there was nothing to evict.
    fn evict_oldest(&self) -> bool {
        let Some((key, age_key)) = self
            .entries
            .iter()
            .min_by_key(|entry| entry.age_key())
            .map(|entry| (entry.key().clone(), entry.age_key()))
        else {
            return false;
        };

        // Skip the removal if the victim was replaced in the meantime; the
        // caller re-checks the size and picks a new victim.
        if self
            .entries
            .remove_if(&key, |_, entry| entry.age_key() == age_key)
            .is_some()
        {
            self.stats.record_eviction();
            debug!(key = %key, "evicted oldest cache entry");
        }
        true
    }
}

#[cfg(test)]
impl<V: Clone> TtlCache<V> {
    /// Inserts an entry with an explicit creation time, bypassing eviction.
    pub(crate) fn insert_created_at(&self, key: &str, value: V, created_at: Instant) {
        self.entries
            .insert(key.to_string(), CacheEntry::with_created_at(value, created_at));
    }

    /// Makes the next call to [`TtlCache::sweep`] panic.
    pub(crate) fn request_sweep_failure(&self) {
        self.fail_next_sweep
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn sweep_failure_pending(&self) -> bool {
        self.fail_next_sweep
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}
