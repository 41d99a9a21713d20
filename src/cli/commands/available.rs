//! `agent-admin available`: the user-facing listing through the cache.

use anyhow::Result;
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::app::AppContext;
use crate::cli::output::{list_table, output, render_list, short_id, timestamp_opt, truncate, CommandOutput};
use crate::domain::models::AvailableAgentsPage;
use crate::services::PageSource;

#[derive(Debug, Serialize)]
pub struct AvailableOutput {
    #[serde(flatten)]
    pub page: AvailableAgentsPage,
    #[serde(skip)]
    pub source: Option<PageSource>,
}

impl CommandOutput for AvailableOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "categories", "intro", "last used"]);
        for agent in &self.page.agents {
            let id = agent.agent_id.to_string();
            table.add_row(vec![
                Cell::new(short_id(&id)),
                Cell::new(truncate(&agent.agent_name, 32)),
                Cell::new(truncate(&agent.categories.join(", "), 30)),
                Cell::new(truncate(agent.agent_intro.as_deref().unwrap_or(""), 40)),
                Cell::new(timestamp_opt(agent.last_used.as_ref())),
            ]);
        }

        let mut out = render_list("agent", &table, self.page.agents.len());
        if self.page.total_count > 0 {
            out.push_str(&format!("\n\nTotal: {}", self.page.total_count));
            if self.page.has_more {
                out.push_str(" (more available)");
            }
        }
        if self.source == Some(PageSource::Cache) {
            out.push_str("\n(served from cache)");
        }
        out
    }
}

pub async fn execute(
    ctx: &AppContext,
    user: &str,
    category: Option<&str>,
    limit: Option<u32>,
    offset: u32,
    json_mode: bool,
) -> Result<()> {
    let (page, source) = ctx
        .listing_service()
        .list_with_source(user, category, limit, offset)
        .await?;
    output(
        &AvailableOutput {
            page,
            source: Some(source),
        },
        json_mode,
    );
    Ok(())
}
