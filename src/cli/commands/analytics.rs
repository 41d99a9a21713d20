//! `agent-admin analytics` commands: usage report, monitoring, categories
//! and health checks.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::app::AppContext;
use crate::cli::id_resolver::resolve_agent_id;
use crate::cli::output::{
    colorize_status, detail_lines, list_table, or_dash, output, render_list, short_id,
    timestamp_opt, truncate, CommandOutput,
};
use crate::cli::types::{AnalyticsArgs, AnalyticsCommands};
use crate::domain::models::{
    AnalyticsQuery, AnalyticsReport, AnalyticsSort, CategorySummary, MonitoringReport, SortOrder,
};
use crate::services::{HealthCheckResult, SweepSummary};

impl CommandOutput for AnalyticsReport {
    fn to_human(&self) -> String {
        let mut table = list_table(&["name", "type", "status", "usage", "last used"]);
        for item in &self.agents {
            table.add_row(vec![
                Cell::new(truncate(&item.agent_name, 32)),
                Cell::new(&item.agent_type),
                Cell::new(colorize_status(&item.status)),
                Cell::new(&item.usage_formatted),
                Cell::new(timestamp_opt(item.last_used.as_ref())),
            ]);
        }
        let total = usize::try_from(self.total).unwrap_or(usize::MAX);
        let mut out = render_list("agent", &table, total);
        out.push_str(&format!(
            "\n\nPage {}/{}  total usage {}  max {}  min {}",
            self.page,
            self.total_pages.max(1),
            self.total_usage,
            or_dash(self.max_usage_formatted.as_deref()),
            or_dash(self.min_usage_formatted.as_deref()),
        ));
        out
    }
}

impl CommandOutput for MonitoringReport {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "health", "activity", "last check", "last active"]);
        for item in &self.agents {
            let id = item.agent_id.to_string();
            table.add_row(vec![
                Cell::new(short_id(&id)),
                Cell::new(truncate(&item.agent_name, 32)),
                Cell::new(colorize_status(item.health_status.as_str())),
                Cell::new(colorize_status(&item.activity_status)),
                Cell::new(timestamp_opt(item.last_health_check.as_ref())),
                Cell::new(timestamp_opt(item.last_active.as_ref())),
            ]);
        }
        format!(
            "{}\n\nHealthy {}  Unhealthy {}  Active {}  Inactive {}",
            render_list("agent", &table, self.total_agents),
            self.healthy_count,
            self.unhealthy_count,
            self.active_count,
            self.inactive_count,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesOutput {
    pub categories: Vec<CategorySummary>,
}

impl CommandOutput for CategoriesOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["category", "agents", "enabled"]);
        for c in &self.categories {
            table.add_row(vec![
                Cell::new(&c.name),
                Cell::new(c.agent_count),
                Cell::new(c.enabled_count),
            ]);
        }
        render_list("category", &table, self.categories.len())
    }
}

impl CommandOutput for HealthCheckResult {
    fn to_human(&self) -> String {
        let mut fields = vec![
            ("Status", colorize_status(self.status.as_str()).to_string()),
            ("URL", or_dash(self.url.as_deref())),
            (
                "HTTP",
                self.http_status.map_or_else(|| "-".to_string(), |s| s.to_string()),
            ),
            ("Checked", timestamp_opt(Some(&self.checked_at))),
        ];
        if let Some(error) = &self.error {
            fields.push(("Error", error.clone()));
        }
        detail_lines(&format!("Health of {}", self.agent_id), &fields)
    }
}

impl CommandOutput for SweepSummary {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "status", "probes"]);
        for entry in &self.agents {
            let id = entry.agent_id.to_string();
            let probes: Vec<String> = entry
                .probes
                .iter()
                .map(|p| match p.http_status {
                    Some(code) => format!("{} {code}", p.source),
                    None => format!("{} unreachable", p.source),
                })
                .collect();
            table.add_row(vec![
                Cell::new(short_id(&id)),
                Cell::new(truncate(&entry.agent_name, 32)),
                Cell::new(colorize_status(entry.status.as_str())),
                Cell::new(or_dash(Some(&probes.join(", ")))),
            ]);
        }
        format!(
            "{}\n\nChecked {}  Healthy {}  Unhealthy {}  Unknown {}",
            render_list("agent", &table, self.checked),
            self.checked,
            self.healthy,
            self.unhealthy,
            self.unknown,
        )
    }
}

/// Accept RFC 3339 or a bare date. A bare `--to` date covers the whole day.
fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{raw}': expected RFC 3339 or YYYY-MM-DD"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    }
    .ok_or_else(|| anyhow!("Invalid time of day"))?;
    Ok(date.and_time(time).and_utc())
}

fn build_query(args: &AnalyticsArgs) -> Result<AnalyticsQuery> {
    let Some(sort_by) = AnalyticsSort::parse_str(&args.sort_by) else {
        bail!("Invalid sort field '{}': use agent_name, usage, status or type", args.sort_by);
    };
    let Some(sort_order) = SortOrder::parse_str(&args.sort_order) else {
        bail!("Invalid sort order '{}': use ASC or DESC", args.sort_order);
    };
    Ok(AnalyticsQuery {
        date_from: args.from.as_deref().map(|d| parse_date(d, false)).transpose()?,
        date_to: args.to.as_deref().map(|d| parse_date(d, true)).transpose()?,
        agent_name: args.name.clone(),
        agent_type: args.agent_type.clone(),
        sort_by,
        sort_order,
        page: args.page,
        limit: args.limit,
    })
}

pub async fn execute(args: AnalyticsArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match &args.command {
        None => {
            let query = build_query(&args)?;
            let report = ctx.analytics_service().report(&query).await?;
            output(&report, json_mode);
        }
        Some(AnalyticsCommands::Monitoring) => {
            let report = ctx.analytics_service().monitoring().await?;
            output(&report, json_mode);
        }
        Some(AnalyticsCommands::Categories) => {
            let categories = ctx.analytics_service().categories().await?;
            output(&CategoriesOutput { categories }, json_mode);
        }
        Some(AnalyticsCommands::Health { id }) => {
            let public_id = resolve_agent_id(&ctx.pool, id).await?;
            let result = ctx.health_service().check_agent(public_id).await?;
            output(&result, json_mode);
        }
        Some(AnalyticsCommands::HealthSweep) => {
            let summary = ctx.health_service().sweep().await?;
            output(&summary, json_mode);
        }
    }
    Ok(())
}
