//! Agent Admin CLI entry point.

use anyhow::Result;
use clap::Parser;

use agent_admin::cli::{commands, handle_error, AppContext, Cli, Commands};
use agent_admin::domain::models::Config;
use agent_admin::infrastructure::config::ConfigLoader;
use agent_admin::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let mut log_config = LogConfig::from_settings(&config.logging)?;
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logger = LoggerImpl::init(&log_config)?;

    dispatch(cli, config).await
}

async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let json_mode = cli.json;

    // Init and migrations run against whatever schema is there; everything
    // else needs the schema at head.
    let command = match cli.command {
        Commands::Init(args) => return commands::init::execute(args, &config, json_mode).await,
        Commands::Migrate(command) => {
            return commands::migrate::execute(command, &config, json_mode).await;
        }
        other => other,
    };

    let ctx = AppContext::build(config).await?;
    match command {
        Commands::Init(_) | Commands::Migrate(_) => unreachable!("handled before the context is built"),
        Commands::Agent(command) => commands::agent::execute(command, &ctx, json_mode).await,
        Commands::Available {
            user,
            category,
            limit,
            offset,
        } => {
            commands::available::execute(&ctx, &user, category.as_deref(), limit, offset, json_mode)
                .await
        }
        Commands::Cache(command) => commands::cache::execute(command, &ctx, json_mode).await,
        Commands::Analytics(args) => commands::analytics::execute(args, &ctx, json_mode).await,
    }
}
