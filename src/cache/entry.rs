//! Cache Entry Module
//!
//! Defines a single stored value together with its write and access timestamps.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was written
    pub inserted_at: Instant,
    /// Last successful read (equal to `inserted_at` until first hit)
    pub last_accessed_at: Instant,
    /// Position in the region's recency index
    pub recency: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry written at `now`.
    pub fn new(value: V, now: Instant, recency: u64) -> Self {
        Self {
            value,
            inserted_at: now,
            last_accessed_at: now,
            recency,
        }
    }

    // == Is Expired ==
    /// Checks whether either expiry dimension has elapsed.
    ///
    /// Boundary condition: an entry is expired as soon as the elapsed time
    /// equals the TTL, so a 10 minute write-TTL entry is already gone at
    /// exactly 10 minutes.
    pub fn is_expired(&self, now: Instant, write_ttl: Duration, access_ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) >= write_ttl
            || now.saturating_duration_since(self.last_accessed_at) >= access_ttl
    }

    // == Touch ==
    /// Records a successful read at `now`.
    pub fn touch(&mut self, now: Instant, recency: u64) {
        self.last_accessed_at = now;
        self.recency = recency;
    }
}
