//! Cache Module
//!
//! Named in-memory cache regions with write/access TTL expiration, LRU
//! eviction, deterministic key construction and the read-through /
//! write-invalidate helpers built on them.

mod clock;
mod entry;
mod key;
mod lru;
mod manager;
mod operation;
mod region;
mod stats;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{CacheKeyBuilder, Nullable, NULL_TOKEN, SEPARATOR};
pub use lru::LruTracker;
pub use manager::CacheManager;
pub use operation::{read_through, read_through_json, write_invalidate, InvalidationPlan};
pub use region::{CacheRegion, RegionConfig};
pub use stats::CacheStats;
