//! Agent repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, AgentDraft, AgentFilter, AgentUsage, CategorySummary, HealthStatus};

/// Repository interface for agent persistence.
///
/// Every mutating call runs in a single transaction and has committed by the
/// time it returns `Ok`.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Insert an agent with its tags, tools and custom features.
    async fn create(&self, draft: &AgentDraft) -> DomainResult<Agent>;

    /// Replace an agent's fields, tags, tools and custom features.
    async fn update(&self, public_id: Uuid, draft: &AgentDraft) -> DomainResult<Agent>;

    /// Flag an agent as deleted. Returns false when no live agent matched.
    async fn soft_delete(&self, public_id: Uuid) -> DomainResult<bool>;

    /// Fetch an agent, deleted or not.
    async fn get_by_public_id(&self, public_id: Uuid) -> DomainResult<Option<Agent>>;

    async fn list(&self, filter: &AgentFilter) -> DomainResult<Vec<Agent>>;

    /// Count matches of `filter`, ignoring its limit and offset.
    async fn count(&self, filter: &AgentFilter) -> DomainResult<u64>;

    /// Agent and enabled counts per category over non-deleted agents.
    async fn category_summary(&self) -> DomainResult<Vec<CategorySummary>>;

    /// Usage events per agent inside an optional date range.
    async fn usage_stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<AgentUsage>>;

    /// Append one usage event and bump `last_used`.
    async fn record_usage(&self, public_id: Uuid, at: DateTime<Utc>) -> DomainResult<()>;

    async fn record_health(
        &self,
        public_id: Uuid,
        status: HealthStatus,
        checked_at: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// Subset of `ids` that are soft-deleted.
    async fn find_deleted_among(&self, ids: &[Uuid]) -> DomainResult<Vec<Uuid>>;

    /// Whether a non-deleted agent other than `exclude` uses `name`.
    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> DomainResult<bool>;
}
