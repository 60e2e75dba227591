//! Cache key construction.
//!
//! Keys are `namespace:component:component...` strings. Component order is
//! part of the key format: reordering components changes every key built
//! with them, so any such change needs a new namespace.

use std::fmt::{self, Display};

use crate::error::{CacheError, Result};

// == Key Format ==
/// Rendering of an absent component.
pub const NULL_TOKEN: &str = "null";

/// Separator between key segments.
pub const SEPARATOR: &str = ":";

// == Nullable Component ==
/// Displays an optional component, rendering `None` as [`NULL_TOKEN`].
///
/// Absent components are never omitted, otherwise two different queries
/// could share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nullable<T>(pub Option<T>);

impl<T: Display> Display for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str(NULL_TOKEN),
        }
    }
}

// == Cache Key Builder ==
/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    // == Single Value Keys ==
    /// `namespace:value`
    pub fn simple(namespace: &str, value: impl Display) -> String {
        format!("{namespace}{SEPARATOR}{value}")
    }

    /// `namespace:tag:value`, the shape used for lookups by one attribute.
    pub fn tagged(namespace: &str, tag: &str, value: impl Display) -> String {
        format!("{namespace}{SEPARATOR}{tag}{SEPARATOR}{value}")
    }

    // == Composite Keys ==
    /// `namespace:v1:v2:...`, requiring at least one component.
    pub fn composite(namespace: &str, values: &[&dyn Display]) -> Result<String> {
        if values.is_empty() {
            return Err(CacheError::InvalidKeyComponents(format!(
                "Composite key for namespace '{namespace}' needs at least one component"
            )));
        }

        let mut key = namespace.to_string();
        for value in values {
            key.push_str(SEPARATOR);
            key.push_str(&value.to_string());
        }
        Ok(key)
    }

    // == Query Keys ==
    /// `namespace:page:{page}:size:{size}:sort:{sort}`
    pub fn page(namespace: &str, page: i64, size: i64, sort: &str) -> Result<String> {
        if page < 0 || size < 0 {
            return Err(CacheError::InvalidPagingParameters { page, size });
        }
        Ok(format!("{namespace}:page:{page}:size:{size}:sort:{sort}"))
    }

    /// `namespace:search:keyword:{k}:category:{c}:author:{a}`
    ///
    /// Each filter is independently optional and renders as [`NULL_TOKEN`]
    /// when absent.
    pub fn search(
        namespace: &str,
        keyword: Option<&str>,
        category: Option<&str>,
        scope_id: Option<u64>,
    ) -> String {
        format!(
            "{namespace}:search:keyword:{}:category:{}:author:{}",
            Nullable(keyword),
            Nullable(category),
            Nullable(scope_id)
        )
    }
}
