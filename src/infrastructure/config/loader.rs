use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{CacheBackend, Config};

/// Project directory holding `config.yaml` and `local.yaml`.
pub const CONFIG_DIR: &str = ".agent-admin";

/// Prefix for environment overrides; nested keys split on `__`.
pub const ENV_PREFIX: &str = "AGENT_ADMIN_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid database acquire_timeout_secs: {0}. Must be at least 1")]
    InvalidAcquireTimeout(u64),

    #[error("cache.redis_url is required when cache.backend is redis")]
    MissingRedisUrl,

    #[error("Invalid cache ttl_secs: {0}. Must be at least 1")]
    InvalidCacheTtl(u64),

    #[error("Invalid cache op_timeout_ms: {0}. Must be at least 1")]
    InvalidCacheTimeout(u64),

    #[error("Invalid listing limits: default_limit ({0}) must be between 1 and max_limit ({1})")]
    InvalidListingLimits(u32, u32),

    #[error("health.healthy_status_codes cannot be empty")]
    EmptyHealthyStatusCodes,

    #[error("Invalid health timeout_secs: {0}. Must be at least 1")]
    InvalidHealthTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .agent-admin/config.yaml
    /// 3. .agent-admin/local.yaml (optional developer overrides)
    /// 4. Environment variables (AGENT_ADMIN_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(CONFIG_DIR)
    }

    /// Same layering as [`load`](Self::load) rooted at `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; environment still overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if config.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidAcquireTimeout(
                config.database.acquire_timeout_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        // A disabled cache never connects, so its settings are not checked.
        if config.cache.enabled {
            if config.cache.backend == CacheBackend::Redis
                && config
                    .cache
                    .redis_url
                    .as_deref()
                    .is_none_or(|url| url.trim().is_empty())
            {
                return Err(ConfigError::MissingRedisUrl);
            }
            if config.cache.ttl_secs == 0 {
                return Err(ConfigError::InvalidCacheTtl(config.cache.ttl_secs));
            }
            if config.cache.op_timeout_ms == 0 {
                return Err(ConfigError::InvalidCacheTimeout(config.cache.op_timeout_ms));
            }
        }

        let listing = &config.listing;
        if listing.max_limit == 0
            || listing.default_limit == 0
            || listing.default_limit > listing.max_limit
        {
            return Err(ConfigError::InvalidListingLimits(
                listing.default_limit,
                listing.max_limit,
            ));
        }

        if config.health.healthy_status_codes.is_empty() {
            return Err(ConfigError::EmptyHealthyStatusCodes);
        }
        if config.health.timeout_secs == 0 {
            return Err(ConfigError::InvalidHealthTimeout(config.health.timeout_secs));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".agent-admin/agent-admin.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.ttl_secs, 900);
        assert_eq!(config.health.healthy_status_codes, vec![200, 401, 403]);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/path.db
  max_connections: 5
logging:
  level: debug
  format: json
cache:
  backend: redis
  redis_url: redis://127.0.0.1:6379
  ttl_secs: 60
listing:
  default_limit: 10
  max_limit: 50
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.op_timeout_ms, 250);
        assert_eq!(config.listing.max_limit, 50);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(f) if f == "xml"
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = "  ".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyDatabasePath
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_zero_acquire_timeout() {
        let mut config = Config::default();
        config.database.acquire_timeout_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidAcquireTimeout(0)
        ));
    }

    #[test]
    fn test_validate_redis_requires_url() {
        let mut config = Config::default();
        config.cache.backend = CacheBackend::Redis;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::MissingRedisUrl
        ));

        config.cache.enabled = false;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidCacheTtl(0)
        ));
    }

    #[test]
    fn test_validate_listing_limits() {
        let mut config = Config::default();
        config.listing.default_limit = 2000;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidListingLimits(2000, 1000)
        ));
    }

    #[test]
    fn test_validate_empty_status_codes() {
        let mut config = Config::default();
        config.health.healthy_status_codes.clear();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyHealthyStatusCodes
        ));
    }

    #[test]
    fn test_local_overrides_project_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "logging:\n  level: info\n  format: json\ncache:\n  ttl_secs: 120\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("local.yaml"), "logging:\n  level: debug\n").unwrap();

        let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(config.cache.ttl_secs, 120);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache:\n  ttl_secs: 120\nlogging:\n  level: info").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("AGENT_ADMIN_CACHE__TTL_SECS", Some("30")),
                ("AGENT_ADMIN_LOGGING__LEVEL", Some("warn")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.cache.ttl_secs, 30);
                assert_eq!(config.logging.level, "warn");
            },
        );
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  rotation: weekly").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("rotation"));
    }
}
