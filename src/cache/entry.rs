//! Cache Entry Module
//!
//! Defines a single cached value stamped with its insertion time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Insertion counter shared by every cache in the process.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

// == Cache Entry ==
/// Represents a single cache entry with its creation metadata.
///
/// Entries are never mutated after insertion. A replacement `put` creates a
/// fresh entry with a fresh timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp
    pub created_at: Instant,
    /// Insertion sequence number, breaks ties between equal timestamps
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Wraps `value` with the current time.
    pub fn new(value: V) -> Self {
        Self::with_created_at(value, Instant::now())
    }

    /// Wraps `value` with an explicit creation time.
    pub fn with_created_at(value: V, created_at: Instant) -> Self {
        Self {
            value,
            created_at,
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    // == Age ==
    /// Age of the entry as observed at `now`.
    ///
    /// Returns `None` when `now` precedes the creation time, which happens if
    /// the caller sampled its clock before this entry was inserted.
    pub fn age_at(&self, now: Instant) -> Option<Duration> {
        now.checked_duration_since(self.created_at)
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived `ttl` at `now`.
    ///
    /// Boundary condition: an entry is expired only when its age is strictly
    /// greater than the TTL. An entry examined at exactly `ttl` is still valid.
    /// An entry created after `now` is not expired.
    pub fn is_expired_at(&self, ttl: Duration, now: Instant) -> bool {
        self.age_at(now).is_some_and(|age| age > ttl)
    }

    /// Checks expiry against the current time.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.is_expired_at(ttl, Instant::now())
    }

    /// Orders entries by creation time, oldest first, then by insertion order.
    pub(crate) fn age_key(&self) -> (Instant, u64) {
        (self.created_at, self.seq)
    }
}
