//! API Handlers
//!
//! HTTP request handlers for the cache admin and observability endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    EvictRequest, EvictResponse, HealthResponse, RegionStatsResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the process-wide cache manager built by the composition root.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache manager
    pub cache: Arc<CacheManager<Value>>,
}

impl AppState {
    /// Creates a new AppState around an existing manager.
    pub fn new(cache: Arc<CacheManager<Value>>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the cache manager from the configured region table.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = CacheManager::new(config.region_table())?;
        Ok(Self::new(Arc::new(cache)))
    }
}

/// Handler for GET /stats
///
/// Returns the stats of every region.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(&state.cache.stats()))
}

/// Handler for GET /stats/:region
///
/// Returns the stats of a single region.
pub async fn region_stats_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<RegionStatsResponse>> {
    let stats = state.cache.region(&region)?.stats();
    Ok(Json(RegionStatsResponse::new(region, &stats)))
}

/// Handler for DELETE /cache/:region
///
/// Clears every entry of one region.
pub async fn clear_region_handler(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<EvictResponse>> {
    state.cache.evict_all(&[region.as_str()])?;
    info!(region = %region, "region cleared via admin API");

    Ok(Json(EvictResponse::cleared(vec![region])))
}

/// Handler for POST /evict
///
/// Clears the named regions, or evicts a single key from one region.
pub async fn evict_handler(
    State(state): State<AppState>,
    Json(req): Json<EvictRequest>,
) -> Result<Json<EvictResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    match req.key {
        Some(key) => {
            let region = &req.regions[0];
            let removed = state.cache.evict_key(region, &key)?;
            info!(region = %region, key = %key, removed, "key evicted via admin API");
            Ok(Json(EvictResponse::key(region.as_str(), key, removed)))
        }
        None => {
            let names: Vec<&str> = req.regions.iter().map(String::as_str).collect();
            state.cache.evict_all(&names)?;
            info!(regions = ?names, "regions cleared via admin API");
            Ok(Json(EvictResponse::cleared(req.regions)))
        }
    }
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
