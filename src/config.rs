//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the shared cache can hold
    pub cache_capacity: usize,
    /// Lifetime of a cache entry in milliseconds
    pub cache_ttl_ms: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Directory holding daily log files and aggregated artifacts
    pub logs_dir: PathBuf,
    /// File name prefix of daily logs (`<prefix>-<yyyy-MM-dd>.log`)
    pub log_file_prefix: String,
    /// Delay every aggregation job waits before scanning
    pub aggregation_delay_ms: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 5)
    /// - `CACHE_TTL_MS` - Entry lifetime in milliseconds (default: 10000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `LOGS_DIR` - Log directory (default: `logs`)
    /// - `LOG_FILE_PREFIX` - Daily log prefix (default: `bookshop2`)
    /// - `AGGREGATION_DELAY_MS` - Aggregation throttle (default: 20000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl_ms: env_or("CACHE_TTL_MS", defaults.cache_ttl_ms),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            logs_dir: env::var_os("LOGS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.logs_dir),
            log_file_prefix: env::var("LOG_FILE_PREFIX").unwrap_or(defaults.log_file_prefix),
            aggregation_delay_ms: env_or("AGGREGATION_DELAY_MS", defaults.aggregation_delay_ms),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn aggregation_delay(&self) -> Duration {
        Duration::from_millis(self.aggregation_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            cache_ttl_ms: crate::cache::DEFAULT_TTL.as_millis() as u64,
            sweep_interval: 10,
            server_port: 8080,
            logs_dir: PathBuf::from("logs"),
            log_file_prefix: "bookshop2".to_string(),
            aggregation_delay_ms: 20_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.cache_ttl_ms, 10_000);
        assert_eq!(config.sweep_interval, 10);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.logs_dir, PathBuf::from("logs"));
        assert_eq!(config.log_file_prefix, "bookshop2");
        assert_eq!(config.aggregation_delay(), Duration::from_secs(20));
    }

    #[test]
    fn test_config_durations() {
        let config = Config {
            cache_ttl_ms: 250,
            sweep_interval: 3,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl(), Duration::from_millis(250));
        assert_eq!(config.sweep_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("BOOKSHOP_TEST_CAPACITY", "not-a-number");
        assert_eq!(env_or("BOOKSHOP_TEST_CAPACITY", 7usize), 7);

        env::set_var("BOOKSHOP_TEST_CAPACITY", "12");
        assert_eq!(env_or("BOOKSHOP_TEST_CAPACITY", 7usize), 12);
        env::remove_var("BOOKSHOP_TEST_CAPACITY");

        assert_eq!(env_or("BOOKSHOP_TEST_UNSET_VAR", 3u16), 3);
    }
}
