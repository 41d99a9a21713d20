//! Command-line front end.

pub mod app;
pub mod commands;
pub mod id_resolver;
pub mod output;
pub mod types;

pub use app::AppContext;
pub use types::{AgentCommands, AnalyticsArgs, AnalyticsCommands, CacheCommands, Cli, Commands, MigrateCommands};

use console::style;

use crate::domain::errors::DomainError;

/// Print a command failure and exit non-zero.
///
/// Domain errors keep their message; anything else prints the full context
/// chain.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = match err.downcast_ref::<DomainError>() {
        Some(DomainError::ValidationFailed(_) | DomainError::DuplicateAgentName(_)) => 2,
        Some(DomainError::AgentNotFound(_) | DomainError::AgentAlreadyDeleted(_)) => 3,
        _ => 1,
    };

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(code)
}
