//! `agent-admin cache` commands.

use anyhow::Result;
use serde::Serialize;

use crate::cli::app::AppContext;
use crate::cli::output::{action_success, output, CommandOutput};
use crate::cli::types::CacheCommands;

#[derive(Debug, Serialize)]
pub struct CacheVersionOutput {
    pub enabled: bool,
    pub version: i64,
    pub invalidated: bool,
}

impl CommandOutput for CacheVersionOutput {
    fn to_human(&self) -> String {
        if !self.enabled {
            return "Listing cache is disabled.".to_string();
        }
        if self.invalidated {
            action_success(&format!("Listing cache invalidated; version is now {}", self.version))
        } else {
            format!("Listing cache version: {}", self.version)
        }
    }
}

pub async fn execute(command: CacheCommands, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let enabled = ctx.cache.is_enabled();
    let out = match command {
        CacheCommands::Invalidate => CacheVersionOutput {
            enabled,
            version: ctx.admin_service().invalidate_cache().await,
            invalidated: enabled,
        },
        CacheCommands::Version => CacheVersionOutput {
            enabled,
            version: ctx.cache.get_current_version().await,
            invalidated: false,
        },
    };
    output(&out, json_mode);
    Ok(())
}
