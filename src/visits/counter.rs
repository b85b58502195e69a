//! Visit Counter
//!
//! Request counts per route, shared between the middleware that records
//! them and the endpoint that reports them.

use std::collections::HashMap;

use dashmap::DashMap;

// == Visit Counter ==
/// Concurrent request counter keyed by route path.
#[derive(Debug, Default)]
pub struct VisitCounter {
    counts: DashMap<String, u64>,
}

impl VisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one visit to `path` and returns the new count.
    pub fn record(&self, path: &str) -> u64 {
        if let Some(mut count) = self.counts.get_mut(path) {
            *count += 1;
            return *count;
        }
        let mut count = self.counts.entry(path.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, path: &str) -> u64 {
        self.counts.get(path).map(|c| *c).unwrap_or(0)
    }

    /// Copies the current counts. Later visits do not show up in the copy.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}
