//! LRU Tracker Module
//!
//! Recency index used to pick the least recently used entry on capacity eviction.

use std::collections::BTreeMap;

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every insert or successful read takes a fresh tick from a monotonic
/// counter. Keys are indexed by their latest tick:
/// - First = least recently used
/// - Last = most recently used
///
/// Ticks are unique, so two entries touched at the same instant are still
/// ordered by which one was touched first.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Latest tick of every tracked key
    order: BTreeMap<u64, String>,
    /// Next tick to hand out
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used and returns its new tick.
    ///
    /// `previous` is the tick the key held before, if it was tracked.
    pub fn touch(&mut self, key: &str, previous: Option<u64>) -> u64 {
        if let Some(tick) = previous {
            self.order.remove(&tick);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, key.to_string());
        tick
    }

    // == Remove ==
    /// Stops tracking the key that holds `tick`.
    pub fn remove(&mut self, tick: u64) {
        self.order.remove(&tick);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    /// Forgets every key. The tick counter keeps running.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
