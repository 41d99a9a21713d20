//! Wiring from a loaded [`Config`] to the services the commands use.

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::{AgentAvailableCache, InMemoryKvStore, RedisKvStore};
use crate::adapters::health::HttpHealthProbe;
use crate::adapters::sqlite::{
    create_pool, database_url, default_migrator, Migrator, PoolConfig, SqliteAgentRepository,
    SqliteAttachmentRepository,
};
use crate::domain::models::{CacheBackend, CacheConfig, Config};
use crate::domain::ports::KvStore;
use crate::services::{AgentAdminService, AnalyticsService, AvailableAgentsService, HealthService};

pub type AdminService = AgentAdminService<SqliteAgentRepository, SqliteAttachmentRepository>;
pub type ListingService = AvailableAgentsService<SqliteAgentRepository>;
pub type AgentHealthService = HealthService<SqliteAgentRepository, HttpHealthProbe>;

pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub cache: Arc<AgentAvailableCache>,
    agents: Arc<SqliteAgentRepository>,
}

impl AppContext {
    /// Open the database without touching the schema.
    pub async fn open_database(config: &Config) -> Result<SqlitePool> {
        let url = database_url(&config.database.path);
        create_pool(&url, Some(PoolConfig::from(&config.database)))
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path))
    }

    pub fn migrator(pool: SqlitePool) -> Result<Migrator> {
        default_migrator(pool).context("Revision chain is invalid")
    }

    /// Open the database, require the schema at head, and connect the cache.
    pub async fn build(config: Config) -> Result<Self> {
        let pool = Self::open_database(&config).await?;

        let migrator = Self::migrator(pool.clone())?;
        let current = migrator.current_revision().await?;
        let head = migrator.ledger().head().map(str::to_string);
        if current != head {
            bail!(
                "Database schema is at {} but the latest revision is {}. Run 'agent-admin migrate up' first.",
                current.as_deref().unwrap_or("base"),
                head.as_deref().unwrap_or("base"),
            );
        }

        let cache = Arc::new(connect_cache(&config.cache).await);
        let agents = Arc::new(SqliteAgentRepository::new(pool.clone()));
        Ok(Self {
            config,
            pool,
            cache,
            agents,
        })
    }

    pub fn admin_service(&self) -> AdminService {
        AgentAdminService::new(
            self.agents.clone(),
            Arc::new(SqliteAttachmentRepository::new(self.pool.clone())),
            self.cache.clone(),
        )
    }

    pub fn listing_service(&self) -> ListingService {
        AvailableAgentsService::new(self.agents.clone(), self.cache.clone(), self.config.listing.clone())
    }

    pub fn analytics_service(&self) -> AnalyticsService<SqliteAgentRepository> {
        AnalyticsService::new(self.agents.clone())
    }

    pub fn health_service(&self) -> AgentHealthService {
        let probe = HttpHealthProbe::new(Duration::from_secs(self.config.health.timeout_secs));
        HealthService::new(self.agents.clone(), Arc::new(probe), self.config.health.clone())
    }
}

/// Build the listing cache for `config`.
///
/// An unreachable Redis leaves the cache disabled rather than failing the
/// command; every lookup then goes to the database.
pub async fn connect_cache(config: &CacheConfig) -> AgentAvailableCache {
    if !config.enabled {
        return AgentAvailableCache::disabled();
    }

    let store: Arc<dyn KvStore> = match config.backend {
        CacheBackend::Memory => Arc::new(InMemoryKvStore::new()),
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().unwrap_or_default();
            match RedisKvStore::connect(url).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!(error = %e, "redis unavailable; listing cache disabled");
                    return AgentAvailableCache::disabled();
                }
            }
        }
    };

    AgentAvailableCache::new(Some(store), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_config_yields_disabled_cache() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        assert!(!connect_cache(&config).await.is_enabled());
        assert!(connect_cache(&CacheConfig::default()).await.is_enabled());
    }

    #[tokio::test]
    async fn test_build_requires_migrated_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("admin.db").to_string_lossy().into_owned();

        let err = AppContext::build(config.clone()).await.err().unwrap();
        assert!(err.to_string().contains("migrate up"));

        let pool = AppContext::open_database(&config).await.unwrap();
        AppContext::migrator(pool)
            .unwrap()
            .upgrade(crate::adapters::sqlite::UpgradeTarget::Head)
            .await
            .unwrap();
        assert!(AppContext::build(config).await.is_ok());
    }
}
