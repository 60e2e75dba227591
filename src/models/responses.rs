//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;

/// Stats of a single region (GET /stats/:region)
#[derive(Debug, Clone, Serialize)]
pub struct RegionStatsResponse {
    /// Region name
    pub region: String,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of TTL expirations
    pub expirations: u64,
    /// Current number of entries in the region
    pub entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl RegionStatsResponse {
    /// Creates a new RegionStatsResponse from a stats snapshot
    pub fn new(region: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            region: region.into(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            entries: stats.entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Per-region stats, sorted by region name
    pub regions: Vec<RegionStatsResponse>,
    /// Hits across all regions
    pub total_hits: u64,
    /// Misses across all regions
    pub total_misses: u64,
    /// Entries across all regions
    pub total_entries: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from the manager's stats map
    pub fn new(stats: &BTreeMap<String, CacheStats>) -> Self {
        let regions: Vec<RegionStatsResponse> = stats
            .iter()
            .map(|(name, stats)| RegionStatsResponse::new(name.as_str(), stats))
            .collect();

        Self {
            total_hits: regions.iter().map(|r| r.hits).sum(),
            total_misses: regions.iter().map(|r| r.misses).sum(),
            total_entries: regions.iter().map(|r| r.entries).sum(),
            regions,
        }
    }
}

/// Response body for the eviction endpoints
#[derive(Debug, Clone, Serialize)]
pub struct EvictResponse {
    /// Success message
    pub message: String,
    /// Regions that were acted on
    pub regions: Vec<String>,
    /// The evicted key, when a single key was targeted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl EvictResponse {
    /// Response for one or more cleared regions
    pub fn cleared(regions: Vec<String>) -> Self {
        Self {
            message: format!("Cleared {} region(s)", regions.len()),
            regions,
            key: None,
        }
    }

    /// Response for a single-key eviction
    pub fn key(region: impl Into<String>, key: impl Into<String>, removed: bool) -> Self {
        let key = key.into();
        let message = if removed {
            format!("Key '{}' evicted", key)
        } else {
            format!("Key '{}' was not cached", key)
        };
        Self {
            message,
            regions: vec![region.into()],
            key: Some(key),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
