//! Service configuration.
//!
//! All configuration is driven by environment variables; unparsable values
//! fall back to the defaults.

use std::env;

/// Bounds applied to the query `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Limit used when a request built from raw parameters omits one.
    pub default_limit: u32,
    /// Upper clamp bound; the lower bound is always 1.
    pub max_limit: u32,
}

impl QueryLimits {
    /// Build limits whose default never exceeds the maximum.
    #[must_use]
    pub fn new(default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }

    /// Clamp a requested limit into `[1, max_limit]`.
    #[must_use]
    pub fn clamp(&self, requested: i64) -> u32 {
        let max = i64::from(self.max_limit.max(1));
        // Bounded by `max`, which came from a `u32`.
        u32::try_from(requested.clamp(1, max)).unwrap_or(self.max_limit)
    }
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Configuration for [`ItemService`](crate::service::ItemService).
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Query limit bounds.
    pub limits: QueryLimits,
    /// Default `ConsistentRead` for `GetItem`.
    pub consistent_read: bool,
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = QueryLimits::default();
        Self {
            limits: QueryLimits::new(
                env_u32("DYNAQUERY_DEFAULT_LIMIT").unwrap_or(defaults.default_limit),
                env_u32("DYNAQUERY_MAX_LIMIT").unwrap_or(defaults.max_limit),
            ),
            consistent_read: env_bool("DYNAQUERY_CONSISTENT_READ", false),
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|v| *v > 0)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.limits.default_limit, 20);
        assert_eq!(config.limits.max_limit, 100);
        assert!(!config.consistent_read);
    }

    #[test]
    fn test_should_clamp_limit_into_range() {
        let limits = QueryLimits::default();
        assert_eq!(limits.clamp(0), 1);
        assert_eq!(limits.clamp(-7), 1);
        assert_eq!(limits.clamp(50), 50);
        assert_eq!(limits.clamp(1000), 100);
    }

    #[test]
    fn test_should_keep_default_limit_within_max() {
        let limits = QueryLimits::new(20, 10);
        assert_eq!(limits.default_limit, 10);
        assert_eq!(limits.max_limit, 10);

        let limits = QueryLimits::new(0, 0);
        assert_eq!(limits.default_limit, 1);
        assert_eq!(limits.max_limit, 1);

        assert_eq!(QueryLimits::new(20, 100), QueryLimits::default());
    }
}
