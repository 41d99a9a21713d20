//! User-facing "available agents" listing behind the versioned cache.

use std::sync::Arc;

use crate::adapters::cache::AgentAvailableCache;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AgentFilter, AvailableAgent, AvailableAgentsPage, ListingConfig, RESERVED_CATEGORY,
};
use crate::domain::ports::AgentRepository;

/// Where a page came from. Exposed for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Cache,
    Database,
}

pub struct AvailableAgentsService<R: AgentRepository> {
    repository: Arc<R>,
    cache: Arc<AgentAvailableCache>,
    listing: ListingConfig,
}

impl<R: AgentRepository> AvailableAgentsService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<AgentAvailableCache>, listing: ListingConfig) -> Self {
        Self {
            repository,
            cache,
            listing,
        }
    }

    pub async fn list(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: Option<u32>,
        offset: u32,
    ) -> DomainResult<AvailableAgentsPage> {
        self.list_with_source(user_id, category, limit, offset)
            .await
            .map(|(page, _)| page)
    }

    /// Same as [`list`](Self::list), also reporting whether the cache served it.
    pub async fn list_with_source(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: Option<u32>,
        offset: u32,
    ) -> DomainResult<(AvailableAgentsPage, PageSource)> {
        let limit = self.listing.clamp_limit(limit);
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != RESERVED_CATEGORY);

        if let Some(page) = self
            .cache
            .get_cached::<AvailableAgentsPage>(user_id, category, limit, offset)
            .await
        {
            let deleted = self
                .repository
                .find_deleted_among(&page.agent_ids())
                .await?;
            if deleted.is_empty() {
                tracing::debug!(user_id, ?category, limit, offset, "available agents served from cache");
                return Ok((page, PageSource::Cache));
            }
            tracing::info!(
                user_id,
                stale = deleted.len(),
                "cached listing references deleted agents; rebuilding"
            );
        }

        // Taken before the query: a mutation that commits while the page is
        // being built bumps the version, and this fill lands under the old one.
        let fill_version = self.cache.fill_version().await;

        let filter = AgentFilter::available(category.map(str::to_string), limit, offset);
        let agents = self.repository.list(&filter).await?;
        let total = self.repository.count(&filter).await?;
        let page = AvailableAgentsPage::new(
            agents.iter().map(AvailableAgent::from).collect(),
            total,
            offset,
        );

        if let Some(version) = fill_version {
            self.cache
                .set_cached_at(version, user_id, category, limit, offset, &page, None)
                .await;
        }
        Ok((page, PageSource::Database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryKvStore;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteAgentRepository};
    use crate::domain::models::{AgentDraft, CacheConfig};
    use crate::domain::models::{Agent, AgentUsage, CategorySummary, HealthStatus};
    use crate::domain::ports::KvStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    async fn setup() -> (
        AvailableAgentsService<SqliteAgentRepository>,
        Arc<SqliteAgentRepository>,
        Arc<AgentAvailableCache>,
    ) {
        let pool = create_migrated_test_pool().await.unwrap();
        let repo = Arc::new(SqliteAgentRepository::new(pool));
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let cache = Arc::new(AgentAvailableCache::new(Some(store), &CacheConfig::default()));
        let service = AvailableAgentsService::new(repo.clone(), cache.clone(), ListingConfig::default());
        (service, repo, cache)
    }

    #[tokio::test]
    async fn test_second_read_hits_cache() {
        let (service, repo, _) = setup().await;
        repo.create(&AgentDraft::new("A").with_categories(["hr"])).await.unwrap();
        repo.create(&AgentDraft::new("B").with_enabled(false)).await.unwrap();

        let (page, source) = service.list_with_source("u1", None, Some(20), 0).await.unwrap();
        assert_eq!(source, PageSource::Database);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.agents[0].agent_name, "A");
        assert!(!page.has_more);

        let (cached, source) = service.list_with_source("u1", Some("ALL"), Some(20), 0).await.unwrap();
        assert_eq!(source, PageSource::Cache);
        assert_eq!(cached, page);
    }

    #[tokio::test]
    async fn test_stale_hit_is_discarded() {
        let (service, repo, _) = setup().await;
        let agent = repo.create(&AgentDraft::new("Gone")).await.unwrap();
        service.list("u1", None, None, 0).await.unwrap();

        // Delete behind the service's back: no invalidation.
        repo.soft_delete(agent.public_id).await.unwrap();

        let (page, source) = service.list_with_source("u1", None, None, 0).await.unwrap();
        assert_eq!(source, PageSource::Database);
        assert!(page.agents.is_empty());
    }

    #[tokio::test]
    async fn test_limit_clamped_and_has_more() {
        let (service, repo, _) = setup().await;
        for name in ["a", "b", "c"] {
            repo.create(&AgentDraft::new(name)).await.unwrap();
        }

        let page = service.list("u1", None, Some(0), 0).await.unwrap();
        assert_eq!(page.agents.len(), 1);
        assert_eq!(page.total_count, 3);
        assert!(page.has_more);

        let page = service.list("u1", None, Some(5000), 2).await.unwrap();
        assert_eq!(page.agents.len(), 1);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_version_bump_forces_miss() {
        let (service, repo, cache) = setup().await;
        repo.create(&AgentDraft::new("one")).await.unwrap();
        service.list("u1", None, None, 0).await.unwrap();

        repo.create(&AgentDraft::new("two")).await.unwrap();
        cache.invalidate_all().await;

        let (page, source) = service.list_with_source("u1", None, None, 0).await.unwrap();
        assert_eq!(source, PageSource::Database);
        assert_eq!(page.total_count, 2);
    }

    /// Lands a rename plus invalidation between the page query and the fill,
    /// once.
    struct RenameDuringCount {
        inner: SqliteAgentRepository,
        cache: Arc<AgentAvailableCache>,
        target: std::sync::Mutex<Option<Uuid>>,
    }

    #[async_trait]
    impl AgentRepository for RenameDuringCount {
        async fn create(&self, draft: &AgentDraft) -> DomainResult<Agent> {
            self.inner.create(draft).await
        }
        async fn update(&self, public_id: Uuid, draft: &AgentDraft) -> DomainResult<Agent> {
            self.inner.update(public_id, draft).await
        }
        async fn soft_delete(&self, public_id: Uuid) -> DomainResult<bool> {
            self.inner.soft_delete(public_id).await
        }
        async fn get_by_public_id(&self, public_id: Uuid) -> DomainResult<Option<Agent>> {
            self.inner.get_by_public_id(public_id).await
        }
        async fn list(&self, filter: &AgentFilter) -> DomainResult<Vec<Agent>> {
            self.inner.list(filter).await
        }
        async fn count(&self, filter: &AgentFilter) -> DomainResult<u64> {
            let target = self.target.lock().unwrap().take();
            if let Some(id) = target {
                self.inner.update(id, &AgentDraft::new("Renamed")).await?;
                self.cache.invalidate_all().await;
            }
            self.inner.count(filter).await
        }
        async fn category_summary(&self) -> DomainResult<Vec<CategorySummary>> {
            self.inner.category_summary().await
        }
        async fn usage_stats(
            &self,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
        ) -> DomainResult<Vec<AgentUsage>> {
            self.inner.usage_stats(from, to).await
        }
        async fn record_usage(&self, public_id: Uuid, at: DateTime<Utc>) -> DomainResult<()> {
            self.inner.record_usage(public_id, at).await
        }
        async fn record_health(
            &self,
            public_id: Uuid,
            status: HealthStatus,
            checked_at: DateTime<Utc>,
        ) -> DomainResult<()> {
            self.inner.record_health(public_id, status, checked_at).await
        }
        async fn find_deleted_among(&self, ids: &[Uuid]) -> DomainResult<Vec<Uuid>> {
            self.inner.find_deleted_among(ids).await
        }
        async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> DomainResult<bool> {
            self.inner.name_taken(name, exclude).await
        }
    }

    #[tokio::test]
    async fn test_mutation_during_fill_is_not_masked() {
        let pool = create_migrated_test_pool().await.unwrap();
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let cache = Arc::new(AgentAvailableCache::new(Some(store), &CacheConfig::default()));
        let repo = Arc::new(RenameDuringCount {
            inner: SqliteAgentRepository::new(pool),
            cache: cache.clone(),
            target: std::sync::Mutex::new(None),
        });
        let agent = repo.create(&AgentDraft::new("Original")).await.unwrap();
        *repo.target.lock().unwrap() = Some(agent.public_id);
        let service = AvailableAgentsService::new(repo, cache.clone(), ListingConfig::default());

        let (page, _) = service.list_with_source("u1", None, None, 0).await.unwrap();
        assert_eq!(page.agents[0].agent_name, "Original");
        assert_eq!(cache.get_current_version().await, 2);

        let (page, source) = service.list_with_source("u1", None, None, 0).await.unwrap();
        assert_eq!(source, PageSource::Database);
        assert_eq!(page.agents[0].agent_name, "Renamed");

        let (_, source) = service.list_with_source("u1", None, None, 0).await.unwrap();
        assert_eq!(source, PageSource::Cache);
    }
}
