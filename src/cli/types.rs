//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::init::InitArgs;

#[derive(Parser, Debug)]
#[command(name = "agent-admin")]
#[command(about = "Agent administration with a versioned listing cache", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to load instead of .agent-admin/config.yaml
    #[arg(long, global = true, env = "AGENT_ADMIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .agent-admin/ with a default config and a migrated database
    Init(InitArgs),

    /// Schema revision management
    #[command(subcommand)]
    Migrate(MigrateCommands),

    /// Agent administration
    #[command(subcommand)]
    Agent(AgentCommands),

    /// List the agents available to a user (cached)
    Available {
        /// Requesting user
        #[arg(short, long)]
        user: String,

        /// Category filter; omit or pass ALL for every category
        #[arg(short, long)]
        category: Option<String>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,

        /// Number of agents to skip
        #[arg(short, long, default_value = "0")]
        offset: u32,
    },

    /// Listing cache maintenance
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Usage analytics, monitoring and health
    Analytics(AnalyticsArgs),
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommands {
    /// Apply pending revisions
    Up {
        /// Stop at this revision instead of head
        #[arg(long)]
        to: Option<String>,
    },

    /// Revert applied revisions, newest first
    Down {
        /// How many revisions to revert
        #[arg(short, long, default_value = "1")]
        steps: usize,
    },

    /// Show every revision and whether it is applied
    Status,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Create an agent from a JSON request file
    Create {
        /// Path to the request JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replace an agent's fields from a JSON request file
    Update {
        /// Agent ID or unique prefix
        id: String,

        /// Path to the request JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show agent details
    Show {
        /// Agent ID or unique prefix
        id: String,
    },

    /// List agents
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Only enabled agents
        #[arg(long)]
        enabled_only: bool,

        /// Include soft-deleted agents
        #[arg(long)]
        include_deleted: bool,

        /// Case-insensitive name substring
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Soft-delete an agent
    Delete {
        /// Agent ID or unique prefix
        id: String,
    },

    /// Record one usage event for an agent
    Use {
        /// Agent ID or unique prefix
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Invalidate every cached listing
    Invalidate,

    /// Show the current listing version
    Version,
}

#[derive(clap::Args, Debug)]
pub struct AnalyticsArgs {
    #[command(subcommand)]
    pub command: Option<AnalyticsCommands>,

    /// Start of the usage window (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End of the usage window (RFC 3339 or YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,

    /// Case-insensitive name substring
    #[arg(long)]
    pub name: Option<String>,

    /// Agent type filter
    #[arg(long = "type")]
    pub agent_type: Option<String>,

    /// Sort by agent_name, usage, status or type
    #[arg(long, default_value = "usage")]
    pub sort_by: String,

    /// ASC or DESC
    #[arg(long, default_value = "DESC")]
    pub sort_order: String,

    /// 1-indexed page
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Page size
    #[arg(long, default_value = "100")]
    pub limit: u32,
}

#[derive(Subcommand, Debug)]
pub enum AnalyticsCommands {
    /// Health and activity overview
    Monitoring,

    /// Agent counts per category
    Categories,

    /// Probe one agent's endpoint and record the result
    Health {
        /// Agent ID or unique prefix
        id: String,
    },

    /// Probe every enabled agent
    HealthSweep,
}
