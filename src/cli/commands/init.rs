//! Implementation of the `agent-admin init` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::adapters::sqlite::{database_url, initialize_database, PoolConfig};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::CONFIG_DIR;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.yaml
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
    pub database_path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.config_written {
            lines.push(format!("\nWrote {CONFIG_DIR}/config.yaml"));
        }
        lines.push(format!(
            "\nDatabase ready at {}",
            self.database_path.display()
        ));
        lines.join("\n")
    }
}

/// Default settings as YAML, the shape `ConfigLoader` reads back.
pub fn default_config_yaml() -> Result<String> {
    serde_yaml::to_string(&Config::default()).context("Failed to render default config")
}

fn database_path(target: &Path, config: &Config) -> PathBuf {
    let path = Path::new(&config.database.path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        target.join(path)
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let target = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let admin_dir = target.join(CONFIG_DIR);
    let mut directories_created = vec![];
    for dir in [admin_dir.clone(), admin_dir.join("logs")] {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let relative = dir
                .strip_prefix(&target)
                .unwrap_or(&dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    let config_path = admin_dir.join("config.yaml");
    let config_written = if config_path.exists() && !args.force {
        false
    } else {
        fs::write(&config_path, default_config_yaml()?)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        true
    };

    let db_path = database_path(&target, config);
    let url = database_url(&db_path.to_string_lossy());
    let pool = initialize_database(
        &url,
        Some(PoolConfig::from(&config.database)),
    )
    .await
    .context("Failed to initialize database")?;
    pool.close().await;

    let message = if config_written || !directories_created.is_empty() {
        "Project initialized successfully."
    } else {
        "Project already initialized; schema brought to head. Use --force to rewrite config.yaml."
    };
    let out = InitOutput {
        success: true,
        message: message.to_string(),
        initialized_path: target,
        directories_created,
        config_written,
        database_path: db_path,
    };
    output(&out, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ConfigLoader;

    #[test]
    fn test_default_yaml_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), default_config_yaml().unwrap()).unwrap();

        let config = ConfigLoader::load_from_file(dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.database.path, ".agent-admin/agent-admin.db");
        assert_eq!(config.cache.ttl_secs, 900);
        assert_eq!(config.listing.max_limit, 1000);
    }

    #[tokio::test]
    async fn test_init_creates_layout_and_database() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };

        execute(args, &Config::default(), true).await.unwrap();

        assert!(dir.path().join(".agent-admin/config.yaml").exists());
        assert!(dir.path().join(".agent-admin/logs").is_dir());
        assert!(dir.path().join(".agent-admin/agent-admin.db").exists());
    }

    #[test]
    fn test_absolute_database_path_kept() {
        let mut config = Config::default();
        config.database.path = "/var/lib/agent-admin/db.sqlite".into();
        assert_eq!(
            database_path(Path::new("/srv/app"), &config),
            PathBuf::from("/var/lib/agent-admin/db.sqlite")
        );
    }
}
