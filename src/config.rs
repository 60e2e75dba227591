//! Configuration Module
//!
//! Loads server settings and the cache region table from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::cache::RegionConfig;

// == Region Names ==
pub const USER_PROFILE_CACHE: &str = "userProfile";
pub const USER_BY_USERNAME_CACHE: &str = "userByUsername";
pub const USER_BY_EMAIL_CACHE: &str = "userByEmail";
pub const ALL_USERS_CACHE: &str = "allUsers";
pub const USER_SEARCH_CACHE: &str = "userSearch";
pub const POST_CACHE: &str = "post";
pub const POST_LIST_CACHE: &str = "postList";
pub const POST_SEARCH_CACHE: &str = "postSearch";

/// Regions that use the default capacity and TTLs.
const DEFAULTED_REGIONS: [&str; 5] = [
    USER_BY_USERNAME_CACHE,
    USER_BY_EMAIL_CACHE,
    USER_SEARCH_CACHE,
    POST_LIST_CACHE,
    POST_SEARCH_CACHE,
];

const MINUTE: u64 = 60;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Capacity for regions without a custom row
    pub default_capacity: usize,
    /// Write TTL in seconds for regions without a custom row
    pub default_write_ttl: u64,
    /// Access TTL in seconds for regions without a custom row
    pub default_access_ttl: u64,
    /// Rows from `CACHE_REGIONS`, applied over the built-in table
    pub region_overrides: Vec<RegionConfig>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 30)
    /// - `CACHE_DEFAULT_CAPACITY` - Default region capacity (default: 1000)
    /// - `CACHE_DEFAULT_WRITE_TTL` - Default write TTL in seconds (default: 600)
    /// - `CACHE_DEFAULT_ACCESS_TTL` - Default access TTL in seconds (default: 300)
    /// - `CACHE_REGIONS` - `name:capacity:write_secs:access_secs` rows, comma separated
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            default_capacity: parse_var("CACHE_DEFAULT_CAPACITY")
                .unwrap_or(defaults.default_capacity),
            default_write_ttl: parse_var("CACHE_DEFAULT_WRITE_TTL")
                .unwrap_or(defaults.default_write_ttl),
            default_access_ttl: parse_var("CACHE_DEFAULT_ACCESS_TTL")
                .unwrap_or(defaults.default_access_ttl),
            region_overrides: env::var("CACHE_REGIONS")
                .map(|raw| parse_region_overrides(&raw))
                .unwrap_or_default(),
        }
    }

    /// Builds the full region table.
    ///
    /// Starts from the built-in rows, then replaces or appends every row
    /// from `region_overrides`.
    pub fn region_table(&self) -> Vec<RegionConfig> {
        let mut table = vec![
            row(USER_PROFILE_CACHE, 500, 15 * MINUTE, 10 * MINUTE),
            row(ALL_USERS_CACHE, 100, 5 * MINUTE, 3 * MINUTE),
            row(POST_CACHE, 200, 20 * MINUTE, 15 * MINUTE),
        ];
        table.extend(DEFAULTED_REGIONS.iter().map(|name| {
            row(
                name,
                self.default_capacity,
                self.default_write_ttl,
                self.default_access_ttl,
            )
        }));

        for custom in &self.region_overrides {
            match table.iter_mut().find(|existing| existing.name == custom.name) {
                Some(existing) => *existing = custom.clone(),
                None => table.push(custom.clone()),
            }
        }
        table
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 30,
            default_capacity: 1000,
            default_write_ttl: 10 * MINUTE,
            default_access_ttl: 5 * MINUTE,
            region_overrides: Vec::new(),
        }
    }
}

fn row(name: &str, capacity: usize, write_secs: u64, access_secs: u64) -> RegionConfig {
    RegionConfig::new(
        name,
        capacity,
        Duration::from_secs(write_secs),
        Duration::from_secs(access_secs),
    )
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Parses `name:capacity:write_secs:access_secs` rows separated by commas.
///
/// Malformed rows are logged and skipped.
pub fn parse_region_overrides(raw: &str) -> Vec<RegionConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| {
            let parsed = parse_region_row(item);
            if parsed.is_none() {
                warn!(row = item, "ignoring malformed CACHE_REGIONS row");
            }
            parsed
        })
        .collect()
}

fn parse_region_row(item: &str) -> Option<RegionConfig> {
    let mut parts = item.split(':').map(str::trim);
    let name = parts.next().filter(|name| !name.is_empty())?;
    let capacity = parts.next()?.parse().ok()?;
    let write_secs = parts.next()?.parse().ok()?;
    let access_secs = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(row(name, capacity, write_secs, access_secs))
}
