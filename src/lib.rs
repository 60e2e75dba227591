//! Entity Cache - named in-process cache regions for a user/post backend
//!
//! Provides bounded regions with write/access TTL expiration and LRU
//! eviction, deterministic cache keys, and services that read through the
//! cache and invalidate it on every mutation.
//!
//! The services are a library surface: callers embed them next to their
//! own HTTP layer and share one [`CacheManager`] with [`AppState`]. The
//! bundled binary serves only the admin endpoints and constructs no
//! services, so on its own its regions stay empty and `/stats` reports
//! zeros.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, CacheRegion, RegionConfig};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_cleanup_task;
