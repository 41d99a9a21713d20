//! The agent schema history, oldest first.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::{DowngradePolicy, Revision};
use crate::adapters::sqlite::schema::{
    add_column_if_missing, drop_column_if_exists, drop_index_if_exists, drop_table_if_exists,
    execute_all, table_exists,
};

/// Every revision the application knows about.
pub fn all_revisions() -> Vec<Box<dyn Revision>> {
    vec![
        Box::new(CreateAgents),
        Box::new(AgentConfigurationAndTags),
        Box::new(TeamsAndHeader),
        Box::new(InstructionCapabilitiesMetadata),
        Box::new(AdminConfig),
        Box::new(NormalizeAgentHeader),
        Box::new(AgentTools),
        Box::new(HealthAndUsage),
        Box::new(AgentSoftDelete),
    ]
}

pub struct CreateAgents;

#[async_trait]
impl Revision for CreateAgents {
    fn id(&self) -> &'static str {
        "0001"
    }

    fn parent(&self) -> Option<&'static str> {
        None
    }

    fn description(&self) -> &'static str {
        "Create agents table"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        execute_all(
            conn,
            &[
                "CREATE TABLE IF NOT EXISTS agents (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    public_id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    intro TEXT,
                    description TEXT,
                    icon TEXT,
                    mcp_url TEXT,
                    health_url TEXT,
                    is_enabled INTEGER NOT NULL DEFAULT 1,
                    last_used TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                "CREATE INDEX IF NOT EXISTS ix_agents_name ON agents(name)",
            ],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_index_if_exists(conn, "ix_agents_name").await?;
        drop_table_if_exists(conn, "agents").await
    }
}

pub struct AgentConfigurationAndTags;

#[async_trait]
impl Revision for AgentConfigurationAndTags {
    fn id(&self) -> &'static str {
        "0002"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0001")
    }

    fn description(&self) -> &'static str {
        "Add agent_configuration, agent_tags and attachments"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        execute_all(
            conn,
            &[
                "CREATE TABLE IF NOT EXISTS agent_configuration (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    agent_id INTEGER NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
                    configuration_name TEXT NOT NULL,
                    config_values TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE (agent_id, configuration_name)
                )",
                "CREATE TABLE IF NOT EXISTS agent_tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    agent_id INTEGER NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
                    tag TEXT NOT NULL,
                    tag_type TEXT NOT NULL DEFAULT 'category',
                    created_at TEXT NOT NULL,
                    UNIQUE (agent_id, tag_type, tag)
                )",
                "CREATE INDEX IF NOT EXISTS ix_agent_tags_tag ON agent_tags(tag_type, tag)",
                "CREATE TABLE IF NOT EXISTS attachments (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    file_name TEXT NOT NULL,
                    file_size INTEGER NOT NULL DEFAULT 0,
                    content_type TEXT,
                    blob_url TEXT NOT NULL,
                    blob_name TEXT NOT NULL,
                    entity_type TEXT,
                    entity_id TEXT,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                )",
            ],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_table_if_exists(conn, "attachments").await?;
        drop_index_if_exists(conn, "ix_agent_tags_tag").await?;
        drop_table_if_exists(conn, "agent_tags").await?;
        drop_table_if_exists(conn, "agent_configuration").await
    }
}

pub struct TeamsAndHeader;

#[async_trait]
impl Revision for TeamsAndHeader {
    fn id(&self) -> &'static str {
        "0003"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0002")
    }

    fn description(&self) -> &'static str {
        "Add include_in_teams and agent_header to agents"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        add_column_if_missing(conn, "agents", "include_in_teams", "INTEGER NOT NULL DEFAULT 0").await?;
        add_column_if_missing(conn, "agents", "agent_header", "TEXT").await?;
        Ok(())
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_column_if_exists(conn, "agents", "agent_header").await?;
        drop_column_if_exists(conn, "agents", "include_in_teams").await?;
        Ok(())
    }
}

/// Moves `instruction` out of `agent_configuration` into its own column.
pub struct InstructionCapabilitiesMetadata;

#[async_trait]
impl Revision for InstructionCapabilitiesMetadata {
    fn id(&self) -> &'static str {
        "0004"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0003")
    }

    fn description(&self) -> &'static str {
        "Add instruction, agent_capabilities, add_history_to_context and agent_metadata"
    }

    fn downgrade_policy(&self) -> DowngradePolicy {
        DowngradePolicy::Lossy {
            reason: "instruction values are not copied back to agent_configuration",
        }
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        add_column_if_missing(conn, "agents", "instruction", "TEXT").await?;
        add_column_if_missing(conn, "agents", "agent_capabilities", "TEXT").await?;
        add_column_if_missing(conn, "agents", "add_history_to_context", "INTEGER NOT NULL DEFAULT 0")
            .await?;
        add_column_if_missing(conn, "agents", "agent_metadata", "TEXT").await?;

        if !table_exists(conn, "agent_configuration").await? {
            return Ok(());
        }

        // Copy first; only then drop the rows this revision owns.
        execute_all(
            conn,
            &[
                "UPDATE agents
                 SET instruction = (
                     SELECT json_extract(c.config_values, '$.instruction')
                     FROM agent_configuration c
                     WHERE c.agent_id = agents.id
                       AND c.configuration_name = 'instruction'
                       AND json_valid(c.config_values)
                 )
                 WHERE EXISTS (
                     SELECT 1 FROM agent_configuration c
                     WHERE c.agent_id = agents.id
                       AND c.configuration_name = 'instruction'
                       AND json_valid(c.config_values)
                       AND json_extract(c.config_values, '$.instruction') IS NOT NULL
                 )",
                "DELETE FROM agent_configuration WHERE configuration_name = 'instruction'",
            ],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_column_if_exists(conn, "agents", "agent_metadata").await?;
        drop_column_if_exists(conn, "agents", "add_history_to_context").await?;
        drop_column_if_exists(conn, "agents", "agent_capabilities").await?;
        drop_column_if_exists(conn, "agents", "instruction").await?;
        Ok(())
    }
}

pub struct AdminConfig;

#[async_trait]
impl Revision for AdminConfig {
    fn id(&self) -> &'static str {
        "0005"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0004")
    }

    fn description(&self) -> &'static str {
        "Add admin_config key/value table"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        execute_all(
            conn,
            &[
                "CREATE TABLE IF NOT EXISTS admin_config (
                    id TEXT PRIMARY KEY,
                    key TEXT NOT NULL,
                    value TEXT,
                    created_by TEXT,
                    updated_by TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                "CREATE UNIQUE INDEX IF NOT EXISTS ix_admin_config_key ON admin_config(key)",
            ],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_index_if_exists(conn, "ix_admin_config_key").await?;
        drop_table_if_exists(conn, "admin_config").await
    }
}

/// Rewrites `agent_header` so every stored value is a JSON object or array.
pub struct NormalizeAgentHeader;

#[async_trait]
impl Revision for NormalizeAgentHeader {
    fn id(&self) -> &'static str {
        "0006"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0005")
    }

    fn description(&self) -> &'static str {
        "Normalize agent_header to JSON"
    }

    fn downgrade_policy(&self) -> DowngradePolicy {
        DowngradePolicy::Lossy {
            reason: "wrapped headers stay wrapped; original text form is not restored",
        }
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        execute_all(
            conn,
            &[
                "UPDATE agents SET agent_header = NULL
                 WHERE agent_header IS NOT NULL AND trim(agent_header) = ''",
                "UPDATE agents SET agent_header = json_object('value', trim(agent_header))
                 WHERE agent_header IS NOT NULL
                   AND NOT (
                       json_valid(agent_header)
                       AND substr(ltrim(agent_header, ' ' || char(9, 10, 13)), 1, 1) IN ('{', '[')
                   )",
            ],
        )
        .await
    }

    async fn downgrade(&self, _conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

pub struct AgentTools;

#[async_trait]
impl Revision for AgentTools {
    fn id(&self) -> &'static str {
        "0007"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0006")
    }

    fn description(&self) -> &'static str {
        "Add agent_tools table"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        execute_all(
            conn,
            &["CREATE TABLE IF NOT EXISTS agent_tools (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id INTEGER NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
                tool_name TEXT NOT NULL,
                tool_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                UNIQUE (agent_id, tool_name)
            )"],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_table_if_exists(conn, "agent_tools").await
    }
}

pub struct HealthAndUsage;

#[async_trait]
impl Revision for HealthAndUsage {
    fn id(&self) -> &'static str {
        "0008"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0007")
    }

    fn description(&self) -> &'static str {
        "Add health columns and agent_usage_metrics"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        add_column_if_missing(conn, "agents", "is_healthy", "INTEGER").await?;
        add_column_if_missing(conn, "agents", "health_status", "TEXT NOT NULL DEFAULT 'unknown'")
            .await?;
        add_column_if_missing(conn, "agents", "last_health_check", "TEXT").await?;
        execute_all(
            conn,
            &[
                "CREATE TABLE IF NOT EXISTS agent_usage_metrics (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    agent_id INTEGER NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
                    used_at TEXT NOT NULL
                )",
                "CREATE INDEX IF NOT EXISTS ix_agent_usage_metrics_agent
                 ON agent_usage_metrics(agent_id, used_at)",
            ],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_index_if_exists(conn, "ix_agent_usage_metrics_agent").await?;
        drop_table_if_exists(conn, "agent_usage_metrics").await?;
        drop_column_if_exists(conn, "agents", "last_health_check").await?;
        drop_column_if_exists(conn, "agents", "health_status").await?;
        drop_column_if_exists(conn, "agents", "is_healthy").await?;
        Ok(())
    }
}

pub struct AgentSoftDelete;

#[async_trait]
impl Revision for AgentSoftDelete {
    fn id(&self) -> &'static str {
        "0009"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("0008")
    }

    fn description(&self) -> &'static str {
        "Add is_deleted soft delete flag to agents"
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        add_column_if_missing(conn, "agents", "is_deleted", "INTEGER NOT NULL DEFAULT 0").await?;
        execute_all(
            conn,
            &["CREATE INDEX IF NOT EXISTS ix_agents_is_deleted ON agents(is_deleted)"],
        )
        .await
    }

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        drop_index_if_exists(conn, "ix_agents_is_deleted").await?;
        drop_column_if_exists(conn, "agents", "is_deleted").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_test_pool;
    use crate::adapters::sqlite::schema::column_exists;

    #[tokio::test]
    async fn test_header_normalization() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        CreateAgents.upgrade(&mut conn).await.unwrap();
        TeamsAndHeader.upgrade(&mut conn).await.unwrap();

        for (public_id, header) in [
            ("a", Some("token-abc")),
            ("b", Some(r#"{"Authorization":"Bearer x"}"#)),
            ("c", Some("   ")),
            ("d", None),
            ("e", Some("42")),
        ] {
            sqlx::query(
                "INSERT INTO agents (public_id, name, agent_header, created_at, updated_at)
                 VALUES (?, ?, ?, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            )
            .bind(public_id)
            .bind(public_id)
            .bind(header)
            .execute(&mut *conn)
            .await
            .unwrap();
        }

        NormalizeAgentHeader.upgrade(&mut conn).await.unwrap();
        NormalizeAgentHeader.upgrade(&mut conn).await.unwrap();

        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT public_id, agent_header FROM agents ORDER BY public_id")
                .fetch_all(&mut *conn)
                .await
                .unwrap();
        assert_eq!(rows[0].1.as_deref(), Some(r#"{"value":"token-abc"}"#));
        assert_eq!(rows[1].1.as_deref(), Some(r#"{"Authorization":"Bearer x"}"#));
        assert_eq!(rows[2].1, None);
        assert_eq!(rows[3].1, None);
        assert_eq!(rows[4].1.as_deref(), Some(r#"{"value":"42"}"#));
    }

    #[tokio::test]
    async fn test_soft_delete_round_trip() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        CreateAgents.upgrade(&mut conn).await.unwrap();

        AgentSoftDelete.upgrade(&mut conn).await.unwrap();
        assert!(column_exists(&mut conn, "agents", "is_deleted").await.unwrap());

        AgentSoftDelete.downgrade(&mut conn).await.unwrap();
        assert!(!column_exists(&mut conn, "agents", "is_deleted").await.unwrap());
    }

    #[test]
    fn test_chain_is_linear() {
        let revisions = all_revisions();
        for pair in revisions.windows(2) {
            assert_eq!(pair[1].parent(), Some(pair[0].id()));
        }
        assert!(revisions[0].parent().is_none());
    }
}
