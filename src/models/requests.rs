//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /evict
///
/// # Fields
/// - `regions`: Regions to act on
/// - `key`: When present, only this key is evicted and exactly one region
///   must be named; otherwise every named region is cleared
#[derive(Debug, Clone, Deserialize)]
pub struct EvictRequest {
    /// Target region names
    pub regions: Vec<String>,
    /// Optional single key
    #[serde(default)]
    pub key: Option<String>,
}

impl EvictRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.regions.is_empty() {
            return Some("At least one region is required".to_string());
        }
        if self.regions.iter().any(|r| r.trim().is_empty()) {
            return Some("Region names cannot be empty".to_string());
        }
        match &self.key {
            Some(key) if key.is_empty() => Some("Key cannot be empty".to_string()),
            Some(_) if self.regions.len() != 1 => {
                Some("Key eviction targets exactly one region".to_string())
            }
            _ => None,
        }
    }
}
