//! Cache Statistics Module
//!
//! Per-region counters polled by the observability surface.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of a region's counters.
///
/// `hits`, `misses`, `evictions` and `expirations` are cumulative and are
/// never reset, not even when the region is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live value
    pub hits: u64,
    /// Lookups on an absent or expired key
    pub misses: u64,
    /// Entries removed to make room under the capacity bound
    pub evictions: u64,
    /// Entries removed because a TTL elapsed
    pub expirations: u64,
    /// Entries currently stored
    pub entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_entries(&mut self, count: usize) {
        self.entries = count;
    }
}
