//! Cache Module
//!
//! Provides the bounded in-memory lookup cache with TTL expiration and
//! insertion-age eviction.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::TtlCache;

use std::time::Duration;

// == Public Constants ==
/// Default maximum number of cached entries
pub const DEFAULT_CAPACITY: usize = 5;

/// Default time-to-live of a cached entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);
