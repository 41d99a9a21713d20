use serde::{Deserialize, Serialize};

/// Main configuration structure for agent-admin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Listing cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Endpoint health probing
    #[serde(default)]
    pub health: HealthConfig,

    /// Available-agents paging limits
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Seconds a connection waits on a locked database before failing
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Write-ahead logging; off falls back to a rollback journal
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_database_path() -> String {
    ".agent-admin/agent-admin.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    3
}

const fn default_busy_timeout_secs() -> u64 {
    30
}

const fn default_wal() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            busy_timeout_secs: default_busy_timeout_secs(),
            wal: default_wal(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Key-value backend behind the listing cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

/// Listing cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Disabled caches report every lookup as a miss
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// Required when backend is redis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,

    /// Entry time-to-live in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on a single store round trip
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_ttl_secs() -> u64 {
    900
}

const fn default_op_timeout_ms() -> u64 {
    250
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            redis_url: None,
            ttl_secs: default_ttl_secs(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

/// Health probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthConfig {
    #[serde(default = "default_health_timeout")]
    pub timeout_secs: u64,

    /// Status codes a sweep treats as healthy
    #[serde(default = "default_healthy_status_codes")]
    pub healthy_status_codes: Vec<u16>,
}

const fn default_health_timeout() -> u64 {
    15
}

fn default_healthy_status_codes() -> Vec<u16> {
    vec![200, 401, 403]
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_health_timeout(),
            healthy_status_codes: default_healthy_status_codes(),
        }
    }
}

/// Paging limits for the available listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListingConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

const fn default_limit() -> u32 {
    20
}

const fn default_max_limit() -> u32 {
    1000
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl ListingConfig {
    /// Clamp a requested page size to `1..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        let listing = ListingConfig::default();
        assert_eq!(listing.clamp_limit(None), 20);
        assert_eq!(listing.clamp_limit(Some(0)), 1);
        assert_eq!(listing.clamp_limit(Some(5000)), 1000);
        assert_eq!(listing.clamp_limit(Some(50)), 50);
    }

    #[test]
    fn test_cache_defaults() {
        let cache: CacheConfig = serde_yaml::from_str("backend: redis").unwrap();
        assert!(cache.enabled);
        assert_eq!(cache.backend, CacheBackend::Redis);
        assert_eq!(cache.ttl_secs, 900);
        assert_eq!(cache.op_timeout_ms, 250);
    }
}
