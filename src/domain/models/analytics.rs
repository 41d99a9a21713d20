//! Usage analytics, monitoring and category summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::HealthStatus;

/// Aggregated usage events for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentUsage {
    pub agent_id: i64,
    pub count: u64,
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsSort {
    AgentName,
    #[default]
    Usage,
    Status,
    Type,
}

impl AnalyticsSort {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "agent_name" | "name" => Some(Self::AgentName),
            "usage" => Some(Self::Usage),
            "status" => Some(Self::Status),
            "type" => Some(Self::Type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring match on the agent name.
    pub agent_name: Option<String>,
    pub agent_type: Option<String>,
    pub sort_by: AnalyticsSort,
    pub sort_order: SortOrder,
    /// 1-indexed.
    pub page: u32,
    pub limit: u32,
}

impl Default for AnalyticsQuery {
    fn default() -> Self {
        Self {
            date_from: None,
            date_to: None,
            agent_name: None,
            agent_type: None,
            sort_by: AnalyticsSort::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsItem {
    pub agent_id: i64,
    pub agent_public_id: Uuid,
    pub agent_name: String,
    pub agent_icon: Option<String>,
    /// "enabled" or "disabled".
    pub status: String,
    pub agent_type: String,
    pub usage: u64,
    pub usage_formatted: String,
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub agents: Vec<AnalyticsItem>,
    /// Matching agents before pagination.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    /// Usage across every agent, ignoring name and type filters.
    pub total_usage: u64,
    pub max_usage: Option<u64>,
    pub min_usage: Option<u64>,
    pub max_usage_formatted: Option<String>,
    pub min_usage_formatted: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringItem {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub agent_icon: Option<String>,
    pub health_status: HealthStatus,
    pub activity_status: String,
    pub last_active: Option<DateTime<Utc>>,
    pub last_health_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub agents: Vec<MonitoringItem>,
    pub total_agents: usize,
    pub healthy_count: usize,
    pub unhealthy_count: usize,
    pub active_count: usize,
    pub inactive_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub agent_count: u64,
    pub enabled_count: u64,
}

/// Render a usage count for dashboards.
///
/// `751_000` → `"751K"`, `500` → `"0.5K"`, `32` → `"32"`, `0` → `"0"`.
#[allow(clippy::cast_precision_loss)]
pub fn format_usage(usage: u64) -> String {
    if usage >= 1000 {
        let thousands = (usage as f64 / 1000.0).round_ties_even();
        format!("{thousands:.0}K")
    } else if usage >= 100 {
        let formatted = format!("{:.1}", usage as f64 / 1000.0);
        let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
        format!("{trimmed}K")
    } else {
        usage.to_string()
    }
}
