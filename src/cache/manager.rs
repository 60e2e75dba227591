//! Cache Manager Module
//!
//! Owns the fixed set of named regions built from the region table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cache::{CacheRegion, CacheStats, Clock, InvalidationPlan, RegionConfig, SystemClock};
use crate::error::{CacheError, Result};

// == Cache Manager ==
/// Process-wide set of cache regions.
///
/// The region table is fixed at construction and never changes, so name
/// lookups need no locking. Each region guards its own state; there is no
/// lock spanning regions.
///
/// The manager is built once by the composition root and handed to every
/// component that needs it, usually as `Arc<CacheManager<V>>`.
#[derive(Debug)]
pub struct CacheManager<V> {
    regions: HashMap<String, Arc<CacheRegion<V>>>,
}

impl<V: Clone> CacheManager<V> {
    // == Constructor ==
    /// Builds one region per table row using the system clock.
    pub fn new(configs: impl IntoIterator<Item = RegionConfig>) -> Result<Self> {
        Self::with_clock(configs, Arc::new(SystemClock))
    }

    /// Builds one region per table row, all sharing `clock`.
    pub fn with_clock(
        configs: impl IntoIterator<Item = RegionConfig>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut regions = HashMap::new();

        for config in configs {
            if regions.contains_key(&config.name) {
                return Err(CacheError::DuplicateRegion(config.name));
            }
            let name = config.name.clone();
            info!(
                region = %name,
                capacity = config.capacity,
                write_ttl_secs = config.write_ttl.as_secs(),
                access_ttl_secs = config.access_ttl.as_secs(),
                "cache region configured"
            );
            let region = CacheRegion::new(config, clock.clone())?;
            regions.insert(name, Arc::new(region));
        }

        Ok(Self { regions })
    }

    // == Region Lookup ==
    /// Returns the region registered under `name`.
    ///
    /// Asking for a name outside the table is a programming error and is
    /// reported as `UnknownRegion`, never as a miss.
    pub fn region(&self, name: &str) -> Result<Arc<CacheRegion<V>>> {
        self.regions.get(name).cloned().ok_or_else(|| {
            error!(region = name, "unknown cache region requested");
            CacheError::UnknownRegion(name.to_string())
        })
    }

    // == Evict All ==
    /// Clears every named region.
    ///
    /// All names are resolved before anything is cleared, so an unknown
    /// name leaves every region untouched.
    pub fn evict_all(&self, names: &[&str]) -> Result<()> {
        let regions = names
            .iter()
            .map(|name| self.region(name))
            .collect::<Result<Vec<_>>>()?;

        for region in regions {
            region.clear();
        }
        debug!(regions = ?names, "regions cleared");
        Ok(())
    }

    // == Evict Key ==
    /// Removes a single key from one region. Returns whether it was present.
    pub fn evict_key(&self, name: &str, key: &str) -> Result<bool> {
        Ok(self.region(name)?.evict(key))
    }

    /// Clears every region.
    pub fn clear_all(&self) {
        for region in self.regions.values() {
            region.clear();
        }
        debug!("all cache regions cleared");
    }

    /// Drops expired entries in every region; returns the total removed.
    pub fn purge_expired(&self) -> usize {
        self.regions
            .values()
            .map(|region| region.purge_expired())
            .sum()
    }

    /// Starts an invalidation plan against this manager's regions.
    pub fn invalidation(&self) -> InvalidationPlan<'_, V> {
        InvalidationPlan::new(self)
    }

    /// Configured region names, sorted.
    pub fn region_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Stats snapshot of every region, keyed by name.
    pub fn stats(&self) -> BTreeMap<String, CacheStats> {
        self.regions
            .iter()
            .map(|(name, region)| (name.clone(), region.stats()))
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::time::Duration;

    const MINUTE: Duration = Duration::from_secs(60);

    fn table() -> Vec<RegionConfig> {
        vec![
            RegionConfig::new("user", 2, 15 * MINUTE, 10 * MINUTE),
            RegionConfig::new("userList", 10, 5 * MINUTE, 3 * MINUTE),
            RegionConfig::new("post", 10, 20 * MINUTE, 15 * MINUTE),
        ]
    }

    #[test]
    fn test_manager_builds_every_region() {
        let manager: CacheManager<String> = CacheManager::new(table()).unwrap();

        assert_eq!(manager.region_names(), vec!["post", "user", "userList"]);
        let user = manager.region("user").unwrap();
        assert_eq!(user.capacity(), 2);
        assert_eq!(user.write_ttl(), 15 * MINUTE);
        assert_eq!(user.access_ttl(), 10 * MINUTE);
    }

    #[test]
    fn test_region_lookup_returns_shared_region() {
        let manager: CacheManager<String> = CacheManager::new(table()).unwrap();

        manager.region("post").unwrap().put("post:id:1", "p".to_string());

        assert_eq!(
            manager.region("post").unwrap().get("post:id:1"),
            Some("p".to_string())
        );
    }

    #[test]
    fn test_unknown_region_fails() {
        let manager: CacheManager<String> = CacheManager::new(table()).unwrap();

        assert_eq!(
            manager.region("comments").unwrap_err(),
            CacheError::UnknownRegion("comments".to_string())
        );
        assert!(manager.evict_key("comments", "k").is_err());
    }

    #[test]
    fn test_duplicate_region_rejected() {
        let mut configs = table();
        configs.push(RegionConfig::new("post", 1, MINUTE, MINUTE));

        let result = CacheManager::<String>::new(configs);
        assert_eq!(
            result.unwrap_err(),
            CacheError::DuplicateRegion("post".to_string())
        );
    }

    #[test]
    fn test_invalid_row_rejected() {
        let configs = vec![RegionConfig::new("post", 0, MINUTE, MINUTE)];
        assert!(matches!(
            CacheManager::<String>::new(configs),
            Err(CacheError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_evict_all_clears_named_regions_only() {
        let manager: CacheManager<String> = CacheManager::new(table()).unwrap();
        manager.region("user").unwrap().put("u", "1".to_string());
        manager.region("userList").unwrap().put("l", "1".to_string());
        manager.region("post").unwrap().put("p", "1".to_string());

        manager.evict_all(&["user", "userList"]).unwrap();

        assert!(manager.region("user").unwrap().is_empty());
        assert!(manager.region("userList").unwrap().is_empty());
        assert_eq!(manager.region("post").unwrap().len(), 1);
    }

    #[test]
    fn test_evict_all_with_unknown_name_clears_nothing() {
        let manager: CacheManager<String> = CacheManager::new(table()).unwrap();
        manager.region("user").unwrap().put("u", "1".to_string());

        let result = manager.evict_all(&["user", "missing"]);

        assert!(matches!(result, Err(CacheError::UnknownRegion(_))));
        assert_eq!(manager.region("user").unwrap().len(), 1);
    }

    #[test]
    fn test_profile_update_scenario() {
        let clock = Arc::new(ManualClock::new());
        let manager: CacheManager<String> =
            CacheManager::with_clock(table(), clock.clone()).unwrap();
        let user = manager.region("user").unwrap();

        user.put("user:profile:1", "userA".to_string());
        assert_eq!(user.get("user:profile:1"), Some("userA".to_string()));

        // user 1 renamed in the store, then the cached profile is dropped
        assert!(manager.evict_key("user", "user:profile:1").unwrap());

        assert_eq!(user.get("user:profile:1"), None);
        let stats = user.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_clear_all_and_stats() {
        let manager: CacheManager<String> = CacheManager::new(table()).unwrap();
        manager.region("user").unwrap().put("u", "1".to_string());
        manager.region("post").unwrap().put("p", "1".to_string());
        manager.region("post").unwrap().get("p");

        manager.clear_all();

        let stats = manager.stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats["post"].hits, 1);
        assert!(stats.values().all(|s| s.entries == 0));
    }

    #[test]
    fn test_purge_expired_across_regions() {
        let clock = Arc::new(ManualClock::new());
        let manager: CacheManager<String> =
            CacheManager::with_clock(table(), clock.clone()).unwrap();
        manager.region("userList").unwrap().put("l", "1".to_string());
        manager.region("post").unwrap().put("p", "1".to_string());

        clock.advance(4 * MINUTE);

        assert_eq!(manager.purge_expired(), 1);
        assert_eq!(manager.region("post").unwrap().len(), 1);
    }
}
