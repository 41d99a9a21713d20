//! Endpoint health checks for agents.
//!
//! Results are written to the agent row only. Health is not part of the
//! available-agents payload, so nothing here touches the listing cache.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentFilter, HealthConfig, HealthStatus};
use crate::domain::ports::{AgentRepository, HealthProbe, ProbeOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub agent_id: Uuid,
    pub url: Option<String>,
    pub status: HealthStatus,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// `mcp_url` or `health_url`.
    pub source: String,
    pub url: String,
    pub http_status: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepEntry {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub status: HealthStatus,
    pub probes: Vec<ProbeReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub checked: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    pub agents: Vec<SweepEntry>,
}

pub struct HealthService<R: AgentRepository, P: HealthProbe> {
    repository: Arc<R>,
    probe: Arc<P>,
    config: HealthConfig,
}

impl<R: AgentRepository, P: HealthProbe> HealthService<R, P> {
    pub fn new(repository: Arc<R>, probe: Arc<P>, config: HealthConfig) -> Self {
        Self {
            repository,
            probe,
            config,
        }
    }

    /// Probe one agent's health URL (falling back to its MCP URL) and record
    /// the outcome.
    pub async fn check_agent(&self, public_id: Uuid) -> DomainResult<HealthCheckResult> {
        let agent = self
            .repository
            .get_by_public_id(public_id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(DomainError::AgentNotFound(public_id))?;

        let url = [agent.health_url.as_deref(), agent.mcp_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|u| !u.is_empty())
            .map(str::to_string);

        let (status, http_status, error) = match url.as_deref() {
            None => (HealthStatus::Unknown, None, None),
            Some(url) => match self.probe.probe(url).await {
                ProbeOutcome::Status(code) => (status_for_code(code), Some(code), None),
                ProbeOutcome::Unreachable(e) => (HealthStatus::Unreachable, None, Some(e)),
            },
        };

        let checked_at = Utc::now();
        self.repository
            .record_health(public_id, status, checked_at)
            .await?;
        tracing::info!(agent_id = %public_id, status = status.as_str(), ?http_status, "health checked");

        Ok(HealthCheckResult {
            agent_id: public_id,
            url,
            status,
            http_status,
            error,
            checked_at,
        })
    }

    /// Probe every enabled agent's endpoints. An agent is healthy when any
    /// endpoint answers with a configured healthy status.
    pub async fn sweep(&self) -> DomainResult<SweepSummary> {
        let filter = AgentFilter {
            enabled_only: true,
            ..AgentFilter::default()
        };
        let agents = self.repository.list(&filter).await?;
        let mut summary = SweepSummary::default();

        for agent in &agents {
            let targets = agent.probe_targets();
            let mut probes = Vec::with_capacity(targets.len());
            for (source, url) in targets {
                let report = match self.probe.probe(url).await {
                    ProbeOutcome::Status(code) => ProbeReport {
                        source: source.to_string(),
                        url: url.to_string(),
                        http_status: Some(code),
                        error: None,
                    },
                    ProbeOutcome::Unreachable(e) => ProbeReport {
                        source: source.to_string(),
                        url: url.to_string(),
                        http_status: None,
                        error: Some(e),
                    },
                };
                probes.push(report);
            }

            let status = if probes.is_empty() {
                HealthStatus::Unknown
            } else if probes.iter().any(|p| {
                p.http_status
                    .is_some_and(|code| self.config.healthy_status_codes.contains(&code))
            }) {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            };

            self.repository
                .record_health(agent.public_id, status, Utc::now())
                .await?;

            match status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Unknown => summary.unknown += 1,
                _ => {
                    tracing::warn!(agent_id = %agent.public_id, name = %agent.name, "agent endpoints unhealthy");
                    summary.unhealthy += 1;
                }
            }
            summary.agents.push(SweepEntry {
                agent_id: agent.public_id,
                agent_name: agent.name.clone(),
                status,
                probes,
            });
        }

        summary.checked = summary.agents.len();
        tracing::info!(
            checked = summary.checked,
            healthy = summary.healthy,
            unhealthy = summary.unhealthy,
            "health sweep finished"
        );
        Ok(summary)
    }
}

fn status_for_code(code: u16) -> HealthStatus {
    match code {
        200 => HealthStatus::Healthy,
        503 => HealthStatus::Degraded,
        _ => HealthStatus::Unhealthy,
    }
}
