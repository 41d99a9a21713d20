//! `agent-admin agent` commands.

use anyhow::{Context, Result};
use comfy_table::Cell;
use serde::Serialize;
use std::path::Path;

use crate::cli::app::AppContext;
use crate::cli::id_resolver::resolve_agent_id;
use crate::cli::output::{
    action_success, colorize_status, detail_lines, list_table, or_dash, output, render_list,
    short_id, timestamp_opt, truncate, CommandOutput,
};
use crate::cli::types::AgentCommands;
use crate::domain::models::{Agent, AgentDraft, AgentFilter, DEFAULT_AGENT_TYPE};

#[derive(Debug, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub agent_type: String,
    pub categories: Vec<String>,
    pub status: String,
    pub health_status: String,
    pub tools_count: usize,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        let status = if agent.is_deleted {
            "deleted"
        } else if agent.is_enabled {
            "enabled"
        } else {
            "disabled"
        };
        Self {
            id: agent.public_id.to_string(),
            name: agent.name.clone(),
            agent_type: agent
                .agent_type
                .clone()
                .unwrap_or_else(|| DEFAULT_AGENT_TYPE.to_string()),
            categories: agent.categories.clone(),
            status: status.to_string(),
            health_status: agent.health_status.as_str().to_string(),
            tools_count: agent.tools.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgentListOutput {
    pub agents: Vec<AgentSummary>,
    pub total: usize,
}

impl CommandOutput for AgentListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "type", "categories", "status", "health", "tools"]);
        for agent in &self.agents {
            table.add_row(vec![
                Cell::new(short_id(&agent.id)),
                Cell::new(truncate(&agent.name, 32)),
                Cell::new(&agent.agent_type),
                Cell::new(truncate(&agent.categories.join(", "), 30)),
                Cell::new(colorize_status(&agent.status)),
                Cell::new(colorize_status(&agent.health_status)),
                Cell::new(agent.tools_count),
            ]);
        }
        render_list("agent", &table, self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct AgentDetailOutput {
    pub agent: Agent,
}

impl CommandOutput for AgentDetailOutput {
    fn to_human(&self) -> String {
        let a = &self.agent;
        let summary = AgentSummary::from(a);
        let tools: Vec<&str> = a.tools.iter().map(|t| t.tool_name.as_str()).collect();
        let mut fields = vec![
            ("ID", a.public_id.to_string()),
            ("Type", summary.agent_type.clone()),
            ("Status", colorize_status(&summary.status).to_string()),
            ("Health", colorize_status(a.health_status.as_str()).to_string()),
            ("Last check", timestamp_opt(a.last_health_check.as_ref())),
            ("Categories", or_dash(Some(&a.categories.join(", ")))),
            ("Tools", or_dash(Some(&tools.join(", ")))),
            ("Icon", or_dash(a.icon.as_deref())),
            ("MCP URL", or_dash(a.mcp_url.as_deref())),
            ("Health URL", or_dash(a.health_url.as_deref())),
            ("In Teams", a.include_in_teams.to_string()),
            ("Last used", timestamp_opt(a.last_used.as_ref())),
            ("Updated", timestamp_opt(Some(&a.updated_at))),
        ];
        if let Some(header) = &a.agent_header {
            fields.push(("Header", header.to_string()));
        }
        if !a.features.is_empty() {
            let mut enabled = Vec::new();
            if a.features.toggle.as_ref().is_some_and(|t| t.enabled) {
                enabled.push("toggle");
            }
            if a.features.dropdown.as_ref().is_some_and(|d| d.enabled) {
                enabled.push("dropdown");
            }
            if a.features.text.as_ref().is_some_and(|t| t.enabled) {
                enabled.push("text");
            }
            fields.push(("Features", or_dash(Some(&enabled.join(", ")))));
        }

        let mut out = detail_lines(&format!("Agent: {}", a.name), &fields);
        if let Some(description) = a.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("\n\n{description}"));
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct AgentActionOutput {
    pub success: bool,
    pub message: String,
    pub agent: Option<AgentSummary>,
}

impl CommandOutput for AgentActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }
}

fn read_draft(path: &Path) -> Result<AgentDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid agent request JSON in {}", path.display()))
}

pub async fn execute(command: AgentCommands, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.admin_service();

    match command {
        AgentCommands::Create { file } => {
            let agent = service.create_agent(read_draft(&file)?).await?;
            let out = AgentActionOutput {
                success: true,
                message: format!("Agent created: {} ({})", agent.name, agent.public_id),
                agent: Some(AgentSummary::from(&agent)),
            };
            output(&out, json_mode);
        }

        AgentCommands::Update { id, file } => {
            let public_id = resolve_agent_id(&ctx.pool, &id).await?;
            let agent = service.update_agent(public_id, read_draft(&file)?).await?;
            let out = AgentActionOutput {
                success: true,
                message: format!("Agent updated: {}", agent.name),
                agent: Some(AgentSummary::from(&agent)),
            };
            output(&out, json_mode);
        }

        AgentCommands::Show { id } => {
            let public_id = resolve_agent_id(&ctx.pool, &id).await?;
            let agent = service.get_agent(public_id).await?;
            output(&AgentDetailOutput { agent }, json_mode);
        }

        AgentCommands::List {
            category,
            enabled_only,
            include_deleted,
            name,
        } => {
            let filter = AgentFilter {
                category,
                enabled_only,
                include_deleted,
                name_pattern: name,
                ..AgentFilter::default()
            };
            let agents = service.list_agents(&filter).await?;
            let out = AgentListOutput {
                total: agents.len(),
                agents: agents.iter().map(AgentSummary::from).collect(),
            };
            output(&out, json_mode);
        }

        AgentCommands::Delete { id } => {
            let public_id = resolve_agent_id(&ctx.pool, &id).await?;
            service.delete_agent(public_id).await?;
            let out = AgentActionOutput {
                success: true,
                message: format!("Agent deleted: {public_id}"),
                agent: None,
            };
            output(&out, json_mode);
        }

        AgentCommands::Use { id } => {
            let public_id = resolve_agent_id(&ctx.pool, &id).await?;
            ctx.analytics_service().record_usage(public_id).await?;
            let out = AgentActionOutput {
                success: true,
                message: format!("Usage recorded for {public_id}"),
                agent: None,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_draft_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"agent_name": "Finance", "categories": ["finance"], "tools": ["search"]}}"#
        )
        .unwrap();

        let draft = read_draft(file.path()).unwrap();
        assert_eq!(draft.agent_name, "Finance");
        assert!(draft.agent_enabled);
        assert_eq!(draft.tools, vec!["search"]);
    }

    #[test]
    fn test_read_draft_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let err = read_draft(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid agent request JSON"));
    }
}
