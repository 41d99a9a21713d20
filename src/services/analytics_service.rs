//! Usage analytics, monitoring overview and category summary.
//!
//! Read-only over the agent repository except for [`AnalyticsService::record_usage`].
//! None of these views go through the listing cache.

use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    format_usage, Agent, AgentFilter, AgentUsage, AnalyticsItem, AnalyticsQuery, AnalyticsReport,
    AnalyticsSort, CategorySummary, MonitoringItem, MonitoringReport, SortOrder,
    DEFAULT_AGENT_TYPE,
};
use crate::domain::ports::AgentRepository;

/// Largest page size analytics will return.
pub const MAX_ANALYTICS_LIMIT: u32 = 1000;

pub struct AnalyticsService<R: AgentRepository> {
    repository: Arc<R>,
}

impl<R: AgentRepository> AnalyticsService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Append one usage event for a live agent.
    pub async fn record_usage(&self, public_id: Uuid) -> DomainResult<()> {
        let agent = self
            .repository
            .get_by_public_id(public_id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(DomainError::AgentNotFound(public_id))?;
        self.repository.record_usage(agent.public_id, Utc::now()).await?;
        tracing::debug!(agent_id = %public_id, "usage recorded");
        Ok(())
    }

    pub async fn report(&self, query: &AnalyticsQuery) -> DomainResult<AnalyticsReport> {
        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if from > to {
                return Err(DomainError::ValidationFailed(
                    "date_from must not be after date_to".to_string(),
                ));
            }
        }

        let agents = self.repository.list(&AgentFilter::default()).await?;
        let usage: HashMap<i64, AgentUsage> = self
            .repository
            .usage_stats(query.date_from, query.date_to)
            .await?
            .into_iter()
            .map(|u| (u.agent_id, u))
            .collect();

        // Totals ignore the name and type filters.
        let total_usage: u64 = agents
            .iter()
            .filter_map(|a| usage.get(&a.id))
            .map(|u| u.count)
            .sum();

        let name_filter = normalized(query.agent_name.as_deref());
        let type_filter = normalized(query.agent_type.as_deref());

        let mut items: Vec<AnalyticsItem> = agents
            .iter()
            .filter(|a| {
                name_filter
                    .as_deref()
                    .is_none_or(|n| a.name.to_lowercase().contains(n))
            })
            .filter(|a| {
                type_filter
                    .as_deref()
                    .is_none_or(|t| agent_type(a).to_lowercase() == t)
            })
            .map(|a| analytics_item(a, usage.get(&a.id)))
            .collect();

        items.sort_by(|a, b| {
            let ord = compare(a, b, query.sort_by);
            let ord = match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.agent_name.to_lowercase().cmp(&b.agent_name.to_lowercase()))
        });

        let max_usage = items.iter().map(|i| i.usage).max();
        let min_usage = items.iter().map(|i| i.usage).min();

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, MAX_ANALYTICS_LIMIT);
        let total = items.len() as u64;
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);

        let skip = usize::try_from((u64::from(page) - 1) * u64::from(limit)).unwrap_or(usize::MAX);
        let agents: Vec<AnalyticsItem> = items.into_iter().skip(skip).take(limit as usize).collect();

        Ok(AnalyticsReport {
            agents,
            total,
            page,
            limit,
            total_pages,
            total_usage,
            max_usage,
            min_usage,
            max_usage_formatted: max_usage.map(format_usage),
            min_usage_formatted: min_usage.map(format_usage),
            date_from: query.date_from,
            date_to: query.date_to,
        })
    }

    /// Health and activity of every non-deleted agent.
    pub async fn monitoring(&self) -> DomainResult<MonitoringReport> {
        let agents = self.repository.list(&AgentFilter::default()).await?;

        let items: Vec<MonitoringItem> = agents
            .iter()
            .map(|a| MonitoringItem {
                agent_id: a.public_id,
                agent_name: a.name.clone(),
                agent_icon: a.icon.clone(),
                health_status: a.health_status,
                activity_status: a.activity_status().to_string(),
                last_active: a.last_used,
                last_health_check: a.last_health_check,
            })
            .collect();

        let healthy_count = agents.iter().filter(|a| a.health_status.is_healthy()).count();
        let unhealthy_count = agents.iter().filter(|a| a.health_status.is_failing()).count();
        let active_count = agents.iter().filter(|a| a.is_enabled).count();

        Ok(MonitoringReport {
            total_agents: items.len(),
            healthy_count,
            unhealthy_count,
            active_count,
            inactive_count: items.len() - active_count,
            agents: items,
        })
    }

    pub async fn categories(&self) -> DomainResult<Vec<CategorySummary>> {
        self.repository.category_summary().await
    }
}

fn normalized(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn agent_type(agent: &Agent) -> &str {
    agent.agent_type.as_deref().unwrap_or(DEFAULT_AGENT_TYPE)
}

fn analytics_item(agent: &Agent, usage: Option<&AgentUsage>) -> AnalyticsItem {
    let count = usage.map_or(0, |u| u.count);
    AnalyticsItem {
        agent_id: agent.id,
        agent_public_id: agent.public_id,
        agent_name: agent.name.clone(),
        agent_icon: agent.icon.clone(),
        status: agent.activity_status().to_string(),
        agent_type: agent_type(agent).to_string(),
        usage: count,
        usage_formatted: format_usage(count),
        last_used: usage.and_then(|u| u.last_used).or(agent.last_used),
    }
}

fn compare(a: &AnalyticsItem, b: &AnalyticsItem, sort: AnalyticsSort) -> Ordering {
    match sort {
        AnalyticsSort::AgentName => a.agent_name.to_lowercase().cmp(&b.agent_name.to_lowercase()),
        AnalyticsSort::Usage => a.usage.cmp(&b.usage),
        AnalyticsSort::Status => a.status.cmp(&b.status),
        AnalyticsSort::Type => a.agent_type.to_lowercase().cmp(&b.agent_type.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteAgentRepository};
    use crate::domain::models::{AgentDraft, HealthStatus};
    use chrono::Duration;

    async fn setup() -> (AnalyticsService<SqliteAgentRepository>, Arc<SqliteAgentRepository>) {
        let pool = create_migrated_test_pool().await.unwrap();
        let repo = Arc::new(SqliteAgentRepository::new(pool));
        (AnalyticsService::new(repo.clone()), repo)
    }

    async fn use_n(repo: &SqliteAgentRepository, id: Uuid, n: usize) {
        for _ in 0..n {
            repo.record_usage(id, Utc::now()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_report_sorts_by_usage_desc_by_default() {
        let (service, repo) = setup().await;
        let a = repo.create(&AgentDraft::new("Alpha")).await.unwrap();
        let b = repo.create(&AgentDraft::new("Beta")).await.unwrap();
        repo.create(&AgentDraft::new("Gamma")).await.unwrap();
        use_n(&repo, a.public_id, 2).await;
        use_n(&repo, b.public_id, 5).await;

        let report = service.report(&AnalyticsQuery::default()).await.unwrap();
        let names: Vec<_> = report.agents.iter().map(|i| i.agent_name.as_str()).collect();
        assert_eq!(names, ["Beta", "Alpha", "Gamma"]);
        assert_eq!(report.total_usage, 7);
        assert_eq!(report.max_usage, Some(5));
        assert_eq!(report.min_usage, Some(0));
        assert_eq!(report.total_pages, 1);
    }

    #[tokio::test]
    async fn test_filters_do_not_change_total_usage() {
        let (service, repo) = setup().await;
        let a = repo.create(&AgentDraft::new("Finance")).await.unwrap();
        let b = repo.create(&AgentDraft::new("Legal")).await.unwrap();
        use_n(&repo, a.public_id, 1).await;
        use_n(&repo, b.public_id, 3).await;

        let query = AnalyticsQuery {
            agent_name: Some("fin".into()),
            ..AnalyticsQuery::default()
        };
        let report = service.report(&query).await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.agents[0].usage, 1);
        assert_eq!(report.total_usage, 4);
    }

    #[tokio::test]
    async fn test_pagination_and_date_range() {
        let (service, repo) = setup().await;
        for name in ["a", "b", "c", "d", "e"] {
            repo.create(&AgentDraft::new(name)).await.unwrap();
        }
        let query = AnalyticsQuery {
            sort_by: AnalyticsSort::AgentName,
            sort_order: SortOrder::Asc,
            page: 2,
            limit: 2,
            ..AnalyticsQuery::default()
        };
        let report = service.report(&query).await.unwrap();
        assert_eq!(report.total_pages, 3);
        let names: Vec<_> = report.agents.iter().map(|i| i.agent_name.as_str()).collect();
        assert_eq!(names, ["c", "d"]);

        let bad = AnalyticsQuery {
            date_from: Some(Utc::now()),
            date_to: Some(Utc::now() - Duration::days(1)),
            ..AnalyticsQuery::default()
        };
        assert!(matches!(
            service.report(&bad).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_monitoring_counts() {
        let (service, repo) = setup().await;
        let up = repo.create(&AgentDraft::new("up")).await.unwrap();
        let down = repo.create(&AgentDraft::new("down")).await.unwrap();
        repo.create(&AgentDraft::new("off").with_enabled(false)).await.unwrap();
        repo.record_health(up.public_id, HealthStatus::Healthy, Utc::now()).await.unwrap();
        repo.record_health(down.public_id, HealthStatus::Unreachable, Utc::now()).await.unwrap();

        let report = service.monitoring().await.unwrap();
        assert_eq!(report.total_agents, 3);
        assert_eq!(report.healthy_count, 1);
        assert_eq!(report.unhealthy_count, 1);
        assert_eq!(report.active_count, 2);
        assert_eq!(report.inactive_count, 1);
    }

    #[tokio::test]
    async fn test_record_usage_rejects_deleted() {
        let (service, repo) = setup().await;
        let agent = repo.create(&AgentDraft::new("x")).await.unwrap();
        service.record_usage(agent.public_id).await.unwrap();
        repo.soft_delete(agent.public_id).await.unwrap();
        assert!(matches!(
            service.record_usage(agent.public_id).await,
            Err(DomainError::AgentNotFound(_))
        ));
    }
}
