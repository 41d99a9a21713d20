//! `agent-admin migrate` commands.

use anyhow::Result;
use comfy_table::Cell;
use serde::Serialize;

use crate::adapters::sqlite::{DowngradeOutcome, RevisionStatus, UpgradeTarget};
use crate::cli::app::AppContext;
use crate::cli::output::{
    action_success, action_warning, colorize_status, list_table, output, CommandOutput,
};
use crate::cli::types::MigrateCommands;
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
pub struct UpgradeOutput {
    pub applied: usize,
    pub current: Option<String>,
}

impl CommandOutput for UpgradeOutput {
    fn to_human(&self) -> String {
        let current = self.current.as_deref().unwrap_or("base");
        if self.applied == 0 {
            format!("Schema already at {current}; nothing to apply.")
        } else {
            action_success(&format!(
                "Applied {} revision(s); schema now at {current}",
                self.applied
            ))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DowngradeOutput {
    pub reverted: Vec<DowngradeOutcome>,
    pub current: Option<String>,
}

impl CommandOutput for DowngradeOutput {
    fn to_human(&self) -> String {
        let current = self.current.as_deref().unwrap_or("base");
        if self.reverted.is_empty() {
            return format!("Schema already at {current}; nothing to revert.");
        }
        let mut lines: Vec<String> = self
            .reverted
            .iter()
            .map(|r| {
                if r.lossy {
                    action_warning(&format!("Reverted {} (lossy: data not restored)", r.revision))
                } else {
                    action_success(&format!("Reverted {}", r.revision))
                }
            })
            .collect();
        lines.push(format!("Schema now at {current}"));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub current: Option<String>,
    pub revisions: Vec<RevisionStatus>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["revision", "parent", "state", "lossy down", "description"]);
        for rev in &self.revisions {
            let state = if rev.applied { "applied" } else { "pending" };
            let marker = if rev.current { " *" } else { "" };
            table.add_row(vec![
                Cell::new(format!("{}{marker}", rev.id)),
                Cell::new(rev.parent.as_deref().unwrap_or("-")),
                Cell::new(colorize_status(state)),
                Cell::new(if rev.lossy_downgrade { "yes" } else { "" }),
                Cell::new(&rev.description),
            ]);
        }
        format!(
            "Current revision: {}\n{table}",
            self.current.as_deref().unwrap_or("base")
        )
    }
}

pub async fn execute(command: MigrateCommands, config: &Config, json_mode: bool) -> Result<()> {
    let pool = AppContext::open_database(config).await?;
    let migrator = AppContext::migrator(pool)?;

    match command {
        MigrateCommands::Up { to } => {
            let target = to.map_or(UpgradeTarget::Head, UpgradeTarget::Revision);
            let applied = migrator.upgrade(target).await?;
            let out = UpgradeOutput {
                applied,
                current: migrator.current_revision().await?,
            };
            output(&out, json_mode);
        }
        MigrateCommands::Down { steps } => {
            let reverted = migrator.downgrade(steps).await?;
            let out = DowngradeOutput {
                reverted,
                current: migrator.current_revision().await?,
            };
            output(&out, json_mode);
        }
        MigrateCommands::Status => {
            let out = StatusOutput {
                current: migrator.current_revision().await?,
                revisions: migrator.status().await?,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
