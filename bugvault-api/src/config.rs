//! API Configuration Module
//!
//! Configuration for CORS, rate limiting, caching, and maintenance
//! settings. Loaded from environment variables with sensible defaults
//! for development.

use std::time::Duration;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, rate limiting, caching, and maintenance.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    // ========================================================================
    // Rate Limiting Configuration
    // ========================================================================
    /// Whether rate limiting is enabled.
    pub rate_limit_enabled: bool,

    /// Default requests per window per (project, API key). Projects can
    /// carry a per-project override in the directory.
    pub rate_limit_max: u32,

    /// Window size for the fixed-window counter.
    pub rate_limit_window: Duration,

    // ========================================================================
    // Cache TTLs
    // ========================================================================
    /// TTL for cached search result pages.
    pub search_ttl_secs: u64,

    /// TTL for cached stats, keyword clouds, trends, and health reports.
    pub stats_ttl_secs: u64,

    /// TTL for cached day-bucketed timeseries.
    pub timeseries_ttl_secs: u64,

    // ========================================================================
    // Ingestion and Maintenance
    // ========================================================================
    /// Maximum number of reports in one batch request. Larger batches are
    /// rejected wholesale.
    pub batch_max_reports: usize,

    /// Age in days after which resolved bugs are moved to the archive.
    pub archive_after_days: i64,

    // ========================================================================
    // Admin
    // ========================================================================
    /// Shared secret for the admin maintenance endpoints. When unset, the
    /// admin surface rejects every request.
    pub admin_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all

            rate_limit_enabled: true,
            rate_limit_max: 200,
            rate_limit_window: Duration::from_secs(60),

            search_ttl_secs: 300,
            stats_ttl_secs: 3600,
            timeseries_ttl_secs: 21600,

            batch_max_reports: 20,
            archive_after_days: 90,

            admin_token: None,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `BUGVAULT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `BUGVAULT_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `BUGVAULT_RATE_LIMIT_MAX`: Requests per window per project key (default: 200)
    /// - `BUGVAULT_RATE_LIMIT_WINDOW_SECS`: Window length in seconds (default: 60)
    /// - `BUGVAULT_SEARCH_TTL_SECS`: Search cache TTL (default: 300)
    /// - `BUGVAULT_STATS_TTL_SECS`: Stats/analytics cache TTL (default: 3600)
    /// - `BUGVAULT_TIMESERIES_TTL_SECS`: Timeseries cache TTL (default: 21600)
    /// - `BUGVAULT_BATCH_MAX_REPORTS`: Batch size cap (default: 20)
    /// - `BUGVAULT_ARCHIVE_AFTER_DAYS`: Resolved-bug archive age (default: 90)
    /// - `BUGVAULT_ADMIN_TOKEN`: Shared secret for admin endpoints (unset = admin disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("BUGVAULT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let rate_limit_enabled = std::env::var("BUGVAULT_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let rate_limit_max = std::env::var("BUGVAULT_RATE_LIMIT_MAX")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_max);

        let rate_limit_window_secs = std::env::var("BUGVAULT_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_window.as_secs());

        let search_ttl_secs = std::env::var("BUGVAULT_SEARCH_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.search_ttl_secs);

        let stats_ttl_secs = std::env::var("BUGVAULT_STATS_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.stats_ttl_secs);

        let timeseries_ttl_secs = std::env::var("BUGVAULT_TIMESERIES_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeseries_ttl_secs);

        let batch_max_reports = std::env::var("BUGVAULT_BATCH_MAX_REPORTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.batch_max_reports);

        let archive_after_days = std::env::var("BUGVAULT_ARCHIVE_AFTER_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.archive_after_days);

        let admin_token = std::env::var("BUGVAULT_ADMIN_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        Self {
            cors_origins,
            rate_limit_enabled,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            search_ttl_secs,
            stats_ttl_secs,
            timeseries_ttl_secs,
            batch_max_reports,
            archive_after_days,
            admin_token,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(config.rate_limit_enabled);
        assert_eq!(config.rate_limit_max, 200);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.search_ttl_secs, 300);
        assert_eq!(config.stats_ttl_secs, 3600);
        assert_eq!(config.timeseries_ttl_secs, 21600);
        assert_eq!(config.batch_max_reports, 20);
        assert_eq!(config.archive_after_days, 90);
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://bugvault.dev".to_string()];
        assert!(config.is_production());
    }
}
