//! Cache Region Module
//!
//! A single named, bounded, time-expiring key-value store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheStats, Clock, LruTracker};
use crate::error::{CacheError, Result};

// == Region Config ==
/// One row of the region table a manager is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    /// Region name, unique within a manager
    pub name: String,
    /// Maximum number of live entries
    pub capacity: usize,
    /// Lifetime measured from insertion
    pub write_ttl: Duration,
    /// Lifetime measured from the most recent hit
    pub access_ttl: Duration,
}

impl RegionConfig {
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        write_ttl: Duration,
        access_ttl: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            capacity,
            write_ttl,
            access_ttl,
        }
    }

    /// Checks that the row describes a usable region.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "Region name cannot be empty".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfiguration(format!(
                "Region '{}' must have a positive capacity",
                self.name
            )));
        }
        if self.write_ttl.is_zero() || self.access_ttl.is_zero() {
            return Err(CacheError::InvalidConfiguration(format!(
                "Region '{}' must have non-zero write and access TTLs",
                self.name
            )));
        }
        Ok(())
    }
}

// == Region State ==
/// Everything guarded by the region lock: entries, recency index and counters.
#[derive(Debug)]
struct RegionState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
    /// Bumped by every invalidation; loads started under an older value are discarded
    generation: u64,
}

impl<V> RegionState<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(entry.recency);
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant, write_ttl: Duration, access_ttl: Duration) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, write_ttl, access_ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }
}

// == Cache Region ==
/// Named cache partition with its own capacity and two-dimensional TTL.
///
/// All operations take `&self`; the entry map, the recency index and the
/// counters sit behind one mutex, so a region can be shared across threads
/// through an `Arc`. The lock is never held across an `.await`.
#[derive(Debug)]
pub struct CacheRegion<V> {
    name: String,
    capacity: usize,
    write_ttl: Duration,
    access_ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<RegionState<V>>,
}

impl<V: Clone> CacheRegion<V> {
    // == Constructor ==
    /// Creates an empty region from a validated config row.
    pub fn new(config: RegionConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: config.name,
            capacity: config.capacity,
            write_ttl: config.write_ttl,
            access_ttl: config.access_ttl,
            clock,
            state: Mutex::new(RegionState {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
                generation: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RegionState<V>> {
        // Every mutation leaves the state consistent before it can panic
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Returns a clone of the live value stored under `key`.
    ///
    /// An expired entry found here is removed on the spot and reported as a
    /// miss. A hit refreshes the access clock and the LRU position.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with(key, |value| Some(value.clone()))
    }

    /// Like [`get`](Self::get), but hands the stored value to `read`.
    ///
    /// When `read` returns `None` the entry is dropped and the lookup counts
    /// as a miss, not a hit.
    pub fn get_with<T>(&self, key: &str, read: impl FnOnce(&V) -> Option<T>) -> Option<T> {
        let now = self.clock.now();
        let mut state = self.lock();
        let state = &mut *state;

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(now, self.write_ttl, self.access_ttl),
            None => {
                state.stats.record_miss();
                trace!(region = %self.name, key, "cache miss");
                return None;
            }
        };

        if expired {
            state.remove(key);
            state.stats.record_expirations(1);
            state.stats.record_miss();
            debug!(region = %self.name, key, "expired entry removed on lookup");
            return None;
        }

        let entry = state.entries.get_mut(key)?;
        let Some(value) = read(&entry.value) else {
            state.remove(key);
            state.stats.record_miss();
            debug!(region = %self.name, key, "unreadable entry removed on lookup");
            return None;
        };

        let tick = state.lru.touch(key, Some(entry.recency));
        entry.touch(now, tick);
        state.stats.record_hit();
        trace!(region = %self.name, key, "cache hit");
        Some(value)
    }

    // == Put ==
    /// Stores `value` under `key`, resetting both expiry clocks.
    ///
    /// Overwriting an existing key never evicts. A new key arriving at a
    /// full region first drops expired entries; if the region is still full
    /// the least recently used entry is evicted.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let now = self.clock.now();
        let mut state = self.lock();
        self.insert(&mut state, key.into(), value, now);
    }

    /// Stores `value` only if no invalidation happened since `generation`
    /// was read. Returns whether the value was stored.
    ///
    /// Loaders read the generation before fetching, so a value fetched
    /// before a write cannot be cached after that write's evictions.
    pub fn put_if_generation(&self, key: impl Into<String>, value: V, generation: u64) -> bool {
        let key = key.into();
        let now = self.clock.now();
        let mut state = self.lock();
        if state.generation != generation {
            debug!(region = %self.name, key = %key, "stale load discarded");
            return false;
        }
        self.insert(&mut state, key, value, now);
        true
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn insert(&self, state: &mut RegionState<V>, key: String, value: V, now: Instant) {
        let previous = state.entries.get(&key).map(|entry| entry.recency);

        if previous.is_none() && state.entries.len() >= self.capacity {
            let purged = state.purge_expired(now, self.write_ttl, self.access_ttl);
            if purged > 0 {
                debug!(region = %self.name, purged, "expired entries purged to make room");
            }

            while state.entries.len() >= self.capacity {
                let Some(victim) = state.lru.evict_oldest() else {
                    break;
                };
                state.entries.remove(&victim);
                state.stats.record_eviction();
                debug!(region = %self.name, key = %victim, "least recently used entry evicted");
            }
        }

        let tick = state.lru.touch(&key, previous);
        state.entries.insert(key, CacheEntry::new(value, now, tick));
    }

    // == Evict ==
    /// Removes `key` if present. Returns whether an entry was removed.
    ///
    /// Loads already in flight for this region are not cached afterwards,
    /// even when nothing was stored under `key`.
    pub fn evict(&self, key: &str) -> bool {
        let mut state = self.lock();
        state.generation += 1;
        let removed = state.remove(key).is_some();
        if removed {
            debug!(region = %self.name, key, "entry evicted");
        }
        removed
    }

    // == Clear ==
    /// Removes every entry. Counters are left untouched.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        let dropped = state.entries.len();
        state.entries.clear();
        state.lru.clear();
        debug!(region = %self.name, dropped, "region cleared");
    }

    // == Purge Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.lock().purge_expired(now, self.write_ttl, self.access_ttl)
    }

    // == Stats ==
    /// Returns a snapshot of the region counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.stats.clone();
        stats.set_entries(state.entries.len());
        stats
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl<V> CacheRegion<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_ttl(&self) -> Duration {
        self.write_ttl
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const MINUTE: Duration = Duration::from_secs(60);

    fn region_with_clock(capacity: usize) -> (CacheRegion<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = RegionConfig::new("test", capacity, 10 * MINUTE, 5 * MINUTE);
        let region = CacheRegion::new(config, clock.clone()).unwrap();
        (region, clock)
    }

    #[test]
    fn test_region_new() {
        let (region, _) = region_with_clock(100);
        assert!(region.is_empty());
        assert_eq!(region.name(), "test");
        assert_eq!(region.capacity(), 100);
        assert_eq!(region.write_ttl(), 10 * MINUTE);
        assert_eq!(region.access_ttl(), 5 * MINUTE);
    }

    #[test]
    fn test_region_rejects_bad_config() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());

        let zero_capacity = RegionConfig::new("r", 0, MINUTE, MINUTE);
        assert!(matches!(
            CacheRegion::<String>::new(zero_capacity, clock.clone()),
            Err(CacheError::InvalidConfiguration(_))
        ));

        let zero_ttl = RegionConfig::new("r", 1, MINUTE, Duration::ZERO);
        assert!(matches!(
            CacheRegion::<String>::new(zero_ttl, clock.clone()),
            Err(CacheError::InvalidConfiguration(_))
        ));

        let blank_name = RegionConfig::new("  ", 1, MINUTE, MINUTE);
        assert!(matches!(
            CacheRegion::<String>::new(blank_name, clock),
            Err(CacheError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_put_then_get_is_hit() {
        let (region, _) = region_with_clock(100);

        region.put("k", "v".to_string());

        assert_eq!(region.get("k"), Some("v".to_string()));
        let stats = region.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_get_absent_is_miss() {
        let (region, _) = region_with_clock(100);

        assert_eq!(region.get("nope"), None);
        let stats = region.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let (region, _) = region_with_clock(1);

        region.put("k", "v1".to_string());
        region.put("k", "v2".to_string());

        assert_eq!(region.get("k"), Some("v2".to_string()));
        assert_eq!(region.len(), 1);
        assert_eq!(region.stats().evictions, 0);
    }

    #[test]
    fn test_overwrite_resets_write_clock() {
        let (region, clock) = region_with_clock(10);

        region.put("k", "v1".to_string());
        clock.advance(4 * MINUTE);
        region.put("k", "v2".to_string());
        clock.advance(4 * MINUTE);

        assert_eq!(region.get("k"), Some("v2".to_string()));
    }

    #[test]
    fn test_write_ttl_expires_despite_constant_reads() {
        let (region, clock) = region_with_clock(10);

        region.put("k", "v".to_string());
        for _ in 0..10 {
            clock.advance(MINUTE);
            if clock.elapsed() < 10 * MINUTE {
                assert!(region.get("k").is_some());
            }
        }
        clock.advance(Duration::from_secs(1));

        assert_eq!(region.get("k"), None);
        assert!(region.is_empty(), "expired entry is removed lazily");
        assert_eq!(region.stats().expirations, 1);
    }

    #[test]
    fn test_access_ttl_expires_idle_entry() {
        let (region, clock) = region_with_clock(10);

        region.put("k", "v".to_string());
        clock.advance(4 * MINUTE);
        assert!(region.get("k").is_some());

        clock.advance(5 * MINUTE + Duration::from_secs(1));
        assert_eq!(region.get("k"), None);
    }

    #[test]
    fn test_access_ttl_boundary_is_inclusive() {
        let (region, clock) = region_with_clock(10);

        region.put("k", "v".to_string());
        clock.advance(5 * MINUTE);

        assert_eq!(region.get("k"), None);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let (region, _) = region_with_clock(2);

        region.put("A", "a".to_string());
        region.put("B", "b".to_string());
        region.put("C", "c".to_string());

        assert_eq!(region.get("A"), None);
        assert!(region.get("B").is_some());
        assert!(region.get("C").is_some());
        assert_eq!(region.stats().evictions, 1);
    }

    #[test]
    fn test_read_protects_from_eviction() {
        let (region, _) = region_with_clock(2);

        region.put("A", "a".to_string());
        region.put("B", "b".to_string());
        region.get("A");
        region.put("C", "c".to_string());

        assert!(region.get("A").is_some());
        assert_eq!(region.get("B"), None);
    }

    #[test]
    fn test_full_region_prefers_dropping_expired_entries() {
        let (region, clock) = region_with_clock(2);

        region.put("old", "o".to_string());
        clock.advance(4 * MINUTE);
        region.put("fresh", "f".to_string());
        clock.advance(2 * MINUTE);
        // "old" is idle past its access TTL, "fresh" is still live
        region.put("new", "n".to_string());

        assert!(region.get("fresh").is_some());
        assert!(region.get("new").is_some());
        let stats = region.stats();
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_evict() {
        let (region, _) = region_with_clock(10);

        region.put("k", "v".to_string());
        assert!(region.evict("k"));
        assert!(!region.evict("k"));
        assert_eq!(region.get("k"), None);

        let stats = region.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_clear_keeps_stats() {
        let (region, _) = region_with_clock(10);

        region.put("a", "1".to_string());
        region.put("b", "2".to_string());
        region.get("a");
        region.get("zzz");
        region.clear();

        assert!(region.is_empty());
        let stats = region.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_region_usable_after_clear() {
        let (region, _) = region_with_clock(2);

        region.put("a", "1".to_string());
        region.put("b", "2".to_string());
        region.clear();
        region.put("c", "3".to_string());
        region.put("d", "4".to_string());
        region.put("e", "5".to_string());

        assert_eq!(region.len(), 2);
        assert_eq!(region.get("c"), None);
    }

    #[test]
    fn test_purge_expired() {
        let (region, clock) = region_with_clock(10);

        region.put("short", "1".to_string());
        clock.advance(3 * MINUTE);
        region.put("long", "2".to_string());
        clock.advance(3 * MINUTE);

        assert_eq!(region.purge_expired(), 1);
        assert_eq!(region.len(), 1);
        assert!(region.get("long").is_some());

        let stats = region.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_put_if_generation_stores_when_unchanged() {
        let (region, _) = region_with_clock(10);
        let generation = region.generation();

        region.put("other", "x".to_string());
        assert!(region.put_if_generation("k", "v".to_string(), generation));
        assert_eq!(region.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_put_if_generation_rejects_load_older_than_eviction() {
        let (region, _) = region_with_clock(10);
        let generation = region.generation();

        // eviction of an absent key still invalidates in-flight loads
        assert!(!region.evict("k"));
        assert!(!region.put_if_generation("k", "stale".to_string(), generation));
        assert_eq!(region.get("k"), None);

        let generation = region.generation();
        region.clear();
        assert!(!region.put_if_generation("k", "stale".to_string(), generation));
        assert!(region.is_empty());
    }

    #[test]
    fn test_get_with_unreadable_value_counts_miss() {
        let (region, _) = region_with_clock(10);
        region.put("k", "not a number".to_string());

        let parsed = region.get_with("k", |value| value.parse::<u32>().ok());

        assert_eq!(parsed, None);
        assert!(region.is_empty());
        let stats = region.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_get_with_readable_value_counts_hit() {
        let (region, _) = region_with_clock(10);
        region.put("k", "42".to_string());

        assert_eq!(region.get_with("k", |value| value.parse::<u32>().ok()), Some(42));
        assert_eq!(region.stats().hits, 1);
    }
}
