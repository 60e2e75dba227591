//! Read-through and write-invalidate helpers.
//!
//! Business operations call these directly around their own loads and
//! mutations:
//!
//! - reads consult a region, run the loader only on a miss and store what
//!   it returns;
//! - writes run the mutation first and, only if it succeeds, evict every
//!   region it affects before reporting success.
//!
//! Two concurrent misses on the same key may both run their loader. There
//! is no request coalescing. A load that overlaps an invalidation of its
//! region returns its value to the caller but does not cache it.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheManager, CacheRegion};
use crate::error::Result;

// == Read Through ==
/// Returns the cached value for `key`, loading and storing it on a miss.
///
/// The region lock is not held while `loader` runs. Loader errors are
/// returned untouched and nothing is cached for them. If the region was
/// invalidated while `loader` ran, the loaded value is returned uncached.
pub async fn read_through<V, E, F, Fut>(
    region: &CacheRegion<V>,
    key: &str,
    loader: F,
) -> std::result::Result<V, E>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<V, E>>,
{
    let generation = region.generation();
    if let Some(value) = region.get(key) {
        return Ok(value);
    }

    let value = loader().await?;
    region.put_if_generation(key, value.clone(), generation);
    Ok(value)
}

/// Typed read-through over a JSON region.
///
/// A cached value that no longer decodes as `T` is dropped, counted as a
/// miss and reloaded. A loaded value that cannot be encoded is returned
/// without being cached.
pub async fn read_through_json<T, E, F, Fut>(
    region: &CacheRegion<Value>,
    key: &str,
    loader: F,
) -> std::result::Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let generation = region.generation();
    let mut decode_error = None;
    let cached = region.get_with(key, |cached| match <T as Deserialize>::deserialize(cached) {
        Ok(value) => Some(value),
        Err(err) => {
            decode_error = Some(err);
            None
        }
    });
    if let Some(value) = cached {
        return Ok(value);
    }
    if let Some(err) = decode_error {
        warn!(region = region.name(), key, error = %err, "undecodable cached value dropped");
    }

    let value = loader().await?;
    match serde_json::to_value(&value) {
        Ok(encoded) => {
            region.put_if_generation(key, encoded, generation);
        }
        Err(err) => {
            warn!(region = region.name(), key, error = %err, "loaded value not cached")
        }
    }
    Ok(value)
}

// == Write Invalidate ==
/// Runs `mutation`, then applies `plan` if it succeeded.
///
/// Evictions complete before this returns, so a read issued after the
/// mutation reports success can only miss or see a value loaded after the
/// write. A failed mutation evicts nothing.
pub async fn write_invalidate<V, T, E, Fut>(
    mutation: Fut,
    plan: &InvalidationPlan<'_, V>,
) -> std::result::Result<T, E>
where
    V: Clone,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let result = mutation.await?;
    plan.apply();
    Ok(result)
}

// == Invalidation Plan ==
#[derive(Debug)]
enum Target<V> {
    Clear(Arc<CacheRegion<V>>),
    Key(Arc<CacheRegion<V>>, String),
}

/// Set of regions and keys a mutation invalidates.
///
/// Region names are resolved while the plan is built, so a misspelt region
/// fails before the mutation runs and applying the plan cannot fail.
#[derive(Debug)]
pub struct InvalidationPlan<'a, V> {
    manager: &'a CacheManager<V>,
    targets: Vec<Target<V>>,
}

impl<'a, V: Clone> InvalidationPlan<'a, V> {
    pub(crate) fn new(manager: &'a CacheManager<V>) -> Self {
        Self {
            manager,
            targets: Vec::new(),
        }
    }

    /// Clears the whole region on apply.
    pub fn clear(mut self, region: &str) -> Result<Self> {
        let region = self.manager.region(region)?;
        self.targets.push(Target::Clear(region));
        Ok(self)
    }

    /// Clears each region on apply.
    pub fn clear_all(self, regions: &[&str]) -> Result<Self> {
        regions.iter().try_fold(self, |plan, region| plan.clear(region))
    }

    /// Evicts a single key from a region on apply.
    pub fn key(mut self, region: &str, key: impl Into<String>) -> Result<Self> {
        let region = self.manager.region(region)?;
        self.targets.push(Target::Key(region, key.into()));
        Ok(self)
    }

    /// Executes every eviction in the order they were added.
    pub fn apply(&self) {
        for target in &self.targets {
            match target {
                Target::Clear(region) => region.clear(),
                Target::Key(region, key) => {
                    region.evict(key);
                }
            }
        }
        debug!(targets = self.targets.len(), "invalidation applied");
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, RegionConfig};
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const MINUTE: Duration = Duration::from_secs(60);

    fn manager() -> CacheManager<String> {
        CacheManager::with_clock(
            vec![
                RegionConfig::new("item", 10, 10 * MINUTE, 5 * MINUTE),
                RegionConfig::new("itemList", 10, 10 * MINUTE, 5 * MINUTE),
            ],
            Arc::new(ManualClock::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_read_through_loads_once() {
        let manager = manager();
        let region = manager.region("item").unwrap();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: std::result::Result<String, String> =
                read_through(&region, "item:1", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok("loaded".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "loaded");
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        let stats = region.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_read_through_does_not_cache_errors() {
        let manager = manager();
        let region = manager.region("item").unwrap();

        let first: std::result::Result<String, String> =
            read_through(&region, "item:404", || async { Err("not found".to_string()) }).await;
        assert_eq!(first.unwrap_err(), "not found");
        assert!(region.is_empty());

        let second: std::result::Result<String, String> =
            read_through(&region, "item:404", || async { Ok("now here".to_string()) }).await;
        assert_eq!(second.unwrap(), "now here");
    }

    #[tokio::test]
    async fn test_read_through_json_round_trips_typed_values() {
        let region = CacheRegion::new(
            RegionConfig::new("nums", 10, MINUTE, MINUTE),
            Arc::new(ManualClock::new()),
        )
        .unwrap();

        let loaded: std::result::Result<Vec<u32>, String> =
            read_through_json(&region, "nums:all", || async { Ok(vec![1, 2, 3]) }).await;
        assert_eq!(loaded.unwrap(), vec![1, 2, 3]);

        let cached: std::result::Result<Vec<u32>, String> =
            read_through_json(&region, "nums:all", || async { Err("unused".to_string()) }).await;
        assert_eq!(cached.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_read_through_json_reloads_undecodable_value() {
        let region = CacheRegion::new(
            RegionConfig::new("nums", 10, MINUTE, MINUTE),
            Arc::new(ManualClock::new()),
        )
        .unwrap();
        region.put("nums:all", Value::String("not a list".to_string()));

        let value: std::result::Result<Vec<u32>, String> =
            read_through_json(&region, "nums:all", || async { Ok(vec![7]) }).await;

        assert_eq!(value.unwrap(), vec![7]);
        let stats = region.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(region.get("nums:all"), Some(serde_json::json!([7])));
    }

    #[tokio::test]
    async fn test_read_through_skips_caching_load_overlapping_eviction() {
        let manager = manager();
        let region = manager.region("item").unwrap();

        let value: std::result::Result<String, String> =
            read_through(&region, "item:7", || async {
                // a write for item 7 completes while this load is in flight
                region.evict("item:7");
                Ok("before write".to_string())
            })
            .await;

        assert_eq!(value.unwrap(), "before write");
        assert_eq!(region.get("item:7"), None);

        let reloaded: std::result::Result<String, String> =
            read_through(&region, "item:7", || async { Ok("after write".to_string()) }).await;
        assert_eq!(reloaded.unwrap(), "after write");
        assert_eq!(region.get("item:7"), Some("after write".to_string()));
    }

    #[tokio::test]
    async fn test_read_through_json_skips_caching_load_overlapping_clear() {
        let region = CacheRegion::new(
            RegionConfig::new("nums", 10, MINUTE, MINUTE),
            Arc::new(ManualClock::new()),
        )
        .unwrap();

        let value: std::result::Result<Vec<u32>, String> =
            read_through_json(&region, "nums:all", || async {
                region.clear();
                Ok(vec![1])
            })
            .await;

        assert_eq!(value.unwrap(), vec![1]);
        assert!(region.is_empty());
    }

    #[tokio::test]
    async fn test_write_invalidate_evicts_after_success() {
        let manager = manager();
        let item = manager.region("item").unwrap();
        let list = manager.region("itemList").unwrap();
        item.put("item:1", "old".to_string());
        item.put("item:2", "other".to_string());
        list.put("item:all", "old list".to_string());

        let plan = manager
            .invalidation()
            .key("item", "item:1")
            .unwrap()
            .clear("itemList")
            .unwrap();
        let result: std::result::Result<u32, String> =
            write_invalidate(async { Ok(1) }, &plan).await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(item.get("item:1"), None);
        assert_eq!(item.get("item:2"), Some("other".to_string()));
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_write_invalidate_keeps_cache_on_failure() {
        let manager = manager();
        let item = manager.region("item").unwrap();
        item.put("item:1", "old".to_string());

        let plan = manager.invalidation().clear_all(&["item", "itemList"]).unwrap();
        let result: std::result::Result<(), String> =
            write_invalidate(async { Err("constraint violated".to_string()) }, &plan).await;

        assert_eq!(result.unwrap_err(), "constraint violated");
        assert_eq!(item.get("item:1"), Some("old".to_string()));
    }

    #[test]
    fn test_plan_rejects_unknown_region() {
        let manager = manager();

        let result = manager.invalidation().clear("item").and_then(|p| p.clear("nope"));

        assert_eq!(
            result.unwrap_err(),
            CacheError::UnknownRegion("nope".to_string())
        );
    }

    #[test]
    fn test_plan_len() {
        let manager = manager();
        let plan = manager.invalidation();
        assert!(plan.is_empty());

        let plan = plan.clear_all(&["item", "itemList"]).unwrap().key("item", "k").unwrap();
        assert_eq!(plan.len(), 3);
    }
}
