//! SQLite implementation of the AgentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::custom_features::{
    DROPDOWN_CONFIG_NAME, TEXT_CONFIG_NAME, TOGGLE_CONFIG_NAME,
};
use crate::domain::models::{
    normalize_header, Agent, AgentDraft, AgentFilter, AgentTool, AgentUsage, CategorySummary,
    CustomFeatures, HealthStatus, TagType, DEFAULT_AGENT_TYPE, RESERVED_CATEGORY,
};
use crate::domain::ports::AgentRepository;

const AGENT_COLUMNS: &str = "id, public_id, name, intro, description, icon, mcp_url, health_url, \
     is_enabled, include_in_teams, agent_header, instruction, agent_capabilities, \
     add_history_to_context, agent_metadata, health_status, last_health_check, is_deleted, \
     last_used, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: AgentRow) -> DomainResult<Agent> {
        let mut conn = self.pool.acquire().await?;
        let relations = load_relations(&mut conn, row.id).await?;
        row.into_agent(relations)
    }

    async fn hydrate_all(&self, rows: Vec<AgentRow>) -> DomainResult<Vec<Agent>> {
        let mut agents = Vec::with_capacity(rows.len());
        for row in rows {
            agents.push(self.hydrate(row).await?);
        }
        Ok(agents)
    }
}

/// Build the WHERE clause shared by `list` and `count`.
fn filter_clause(filter: &AgentFilter) -> (String, Vec<String>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut bindings: Vec<String> = Vec::new();

    if !filter.include_deleted {
        sql.push_str(" AND a.is_deleted = 0");
    }
    if filter.enabled_only {
        sql.push_str(" AND a.is_enabled = 1");
    }
    if let Some(category) = filter
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != RESERVED_CATEGORY)
    {
        sql.push_str(
            " AND EXISTS (SELECT 1 FROM agent_tags t WHERE t.agent_id = a.id \
             AND t.tag_type = 'category' AND t.tag = ?)",
        );
        bindings.push(category.to_string());
    }
    if let Some(pattern) = &filter.name_pattern {
        sql.push_str(" AND a.name LIKE ?");
        let pattern = pattern.replace('*', "%");
        bindings.push(if pattern.contains('%') {
            pattern
        } else {
            format!("%{pattern}%")
        });
    }

    (sql, bindings)
}

fn bool_int(value: bool) -> i32 {
    i32::from(value)
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, draft: &AgentDraft) -> DomainResult<Agent> {
        let header = draft
            .resolved_header()
            .map(|v| serde_json::to_string(&v))
            .transpose()?;
        let metadata = draft
            .agent_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let public_id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"INSERT INTO agents (public_id, name, intro, description, icon, mcp_url, health_url,
               is_enabled, include_in_teams, agent_header, instruction, agent_capabilities,
               add_history_to_context, agent_metadata, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(public_id.to_string())
        .bind(draft.agent_name.trim())
        .bind(&draft.agent_intro)
        .bind(&draft.description)
        .bind(&draft.agent_icon)
        .bind(&draft.mcp_server_link)
        .bind(&draft.agent_health_url)
        .bind(bool_int(draft.agent_enabled))
        .bind(bool_int(draft.include_in_teams))
        .bind(&header)
        .bind(&draft.instruction)
        .bind(&draft.agent_capabilities)
        .bind(bool_int(draft.add_history_to_context))
        .bind(&metadata)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        write_relations(&mut tx, result.last_insert_rowid(), draft, &now).await?;
        tx.commit().await?;

        self.get_by_public_id(public_id)
            .await?
            .ok_or(DomainError::AgentNotFound(public_id))
    }

    async fn update(&self, public_id: Uuid, draft: &AgentDraft) -> DomainResult<Agent> {
        let header = draft
            .resolved_header()
            .map(|v| serde_json::to_string(&v))
            .transpose()?;
        let metadata = draft
            .agent_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM agents WHERE public_id = ? AND is_deleted = 0")
                .bind(public_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let id = id.ok_or(DomainError::AgentNotFound(public_id))?;

        sqlx::query(
            r#"UPDATE agents SET name = ?, intro = ?, description = ?, icon = ?, mcp_url = ?,
               health_url = ?, is_enabled = ?, include_in_teams = ?, agent_header = ?,
               instruction = ?, agent_capabilities = ?, add_history_to_context = ?,
               agent_metadata = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(draft.agent_name.trim())
        .bind(&draft.agent_intro)
        .bind(&draft.description)
        .bind(&draft.agent_icon)
        .bind(&draft.mcp_server_link)
        .bind(&draft.agent_health_url)
        .bind(bool_int(draft.agent_enabled))
        .bind(bool_int(draft.include_in_teams))
        .bind(&header)
        .bind(&draft.instruction)
        .bind(&draft.agent_capabilities)
        .bind(bool_int(draft.add_history_to_context))
        .bind(&metadata)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        write_relations(&mut tx, id, draft, &now).await?;
        tx.commit().await?;

        self.get_by_public_id(public_id)
            .await?
            .ok_or(DomainError::AgentNotFound(public_id))
    }

    async fn soft_delete(&self, public_id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE agents SET is_deleted = 1, updated_at = ? WHERE public_id = ? AND is_deleted = 0",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(public_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_public_id(&self, public_id: Uuid) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> =
            sqlx::query_as(&format!("SELECT {AGENT_COLUMNS} FROM agents WHERE public_id = ?"))
                .bind(public_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &AgentFilter) -> DomainResult<Vec<Agent>> {
        let (clause, bindings) = filter_clause(filter);
        let columns = AGENT_COLUMNS
            .split(", ")
            .map(|c| format!("a.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {columns} FROM agents a{clause} ORDER BY a.name COLLATE NOCASE, a.id");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = filter.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        let mut q = sqlx::query_as::<_, AgentRow>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows = q.fetch_all(&self.pool).await?;
        self.hydrate_all(rows).await
    }

    async fn count(&self, filter: &AgentFilter) -> DomainResult<u64> {
        let (clause, bindings) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM agents a{clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let count = q.fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn category_summary(&self) -> DomainResult<Vec<CategorySummary>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"SELECT t.tag,
                      COUNT(DISTINCT a.id),
                      COUNT(DISTINCT CASE WHEN a.is_enabled = 1 THEN a.id END)
               FROM agent_tags t
               JOIN agents a ON a.id = t.agent_id
               WHERE t.tag_type = 'category' AND a.is_deleted = 0
               GROUP BY t.tag
               ORDER BY t.tag COLLATE NOCASE"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, agent_count, enabled_count)| CategorySummary {
                name,
                agent_count: u64::try_from(agent_count).unwrap_or(0),
                enabled_count: u64::try_from(enabled_count).unwrap_or(0),
            })
            .collect())
    }

    async fn usage_stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<AgentUsage>> {
        let from = from.map(|t| t.to_rfc3339());
        let to = to.map(|t| t.to_rfc3339());
        let rows: Vec<(i64, i64, Option<String>)> = sqlx::query_as(
            r#"SELECT agent_id, COUNT(*), MAX(used_at)
               FROM agent_usage_metrics
               WHERE (?1 IS NULL OR used_at >= ?1) AND (?2 IS NULL OR used_at <= ?2)
               GROUP BY agent_id"#,
        )
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(agent_id, count, last_used)| {
                Ok(AgentUsage {
                    agent_id,
                    count: u64::try_from(count).unwrap_or(0),
                    last_used: super::parse_optional_datetime(last_used)?,
                })
            })
            .collect()
    }

    async fn record_usage(&self, public_id: Uuid, at: DateTime<Utc>) -> DomainResult<()> {
        let at = at.to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM agents WHERE public_id = ?")
            .bind(public_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let id = id.ok_or(DomainError::AgentNotFound(public_id))?;

        sqlx::query("INSERT INTO agent_usage_metrics (agent_id, used_at) VALUES (?, ?)")
            .bind(id)
            .bind(&at)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE agents SET last_used = ?1 WHERE id = ?2 AND (last_used IS NULL OR last_used < ?1)",
        )
        .bind(&at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_health(
        &self,
        public_id: Uuid,
        status: HealthStatus,
        checked_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE agents SET health_status = ?, is_healthy = ?, last_health_check = ? WHERE public_id = ?",
        )
        .bind(status.as_str())
        .bind(bool_int(status.is_healthy()))
        .bind(checked_at.to_rfc3339())
        .bind(public_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AgentNotFound(public_id));
        }
        Ok(())
    }

    async fn find_deleted_among(&self, ids: &[Uuid]) -> DomainResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT public_id FROM agents WHERE is_deleted = 1 AND public_id IN ({placeholders})"
        );

        let mut q = sqlx::query_scalar::<_, String>(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(|s| super::parse_uuid(s)).collect()
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> DomainResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM agents
               WHERE name = ?1 COLLATE NOCASE AND is_deleted = 0
                 AND (?2 IS NULL OR public_id != ?2)"#,
        )
        .bind(name.trim())
        .bind(exclude.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

/// Replace tags, custom feature rows and tools for `agent_id`.
async fn write_relations(
    conn: &mut SqliteConnection,
    agent_id: i64,
    draft: &AgentDraft,
    now: &str,
) -> DomainResult<()> {
    sqlx::query("DELETE FROM agent_tags WHERE agent_id = ? AND tag_type IN ('category', 'type')")
        .bind(agent_id)
        .execute(&mut *conn)
        .await?;

    for category in draft.normalized_categories() {
        sqlx::query("INSERT INTO agent_tags (agent_id, tag, tag_type, created_at) VALUES (?, ?, ?, ?)")
            .bind(agent_id)
            .bind(&category)
            .bind(TagType::Category.as_str())
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    let agent_type = draft
        .agent_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_AGENT_TYPE);
    sqlx::query("INSERT INTO agent_tags (agent_id, tag, tag_type, created_at) VALUES (?, ?, ?, ?)")
        .bind(agent_id)
        .bind(agent_type)
        .bind(TagType::Type.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM agent_configuration WHERE agent_id = ? AND configuration_name IN (?, ?, ?)")
        .bind(agent_id)
        .bind(TOGGLE_CONFIG_NAME)
        .bind(DROPDOWN_CONFIG_NAME)
        .bind(TEXT_CONFIG_NAME)
        .execute(&mut *conn)
        .await?;

    let configs = [
        (TOGGLE_CONFIG_NAME, draft.custom_feature_toggle.as_ref().map(serde_json::to_string).transpose()?),
        (DROPDOWN_CONFIG_NAME, draft.custom_feature_dropdown.as_ref().map(serde_json::to_string).transpose()?),
        (TEXT_CONFIG_NAME, draft.custom_feature_text.as_ref().map(serde_json::to_string).transpose()?),
    ];
    for (name, values) in configs {
        let Some(values) = values else { continue };
        sqlx::query(
            r#"INSERT INTO agent_configuration (agent_id, configuration_name, config_values, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(agent_id)
        .bind(name)
        .bind(&values)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("DELETE FROM agent_tools WHERE agent_id = ?")
        .bind(agent_id)
        .execute(&mut *conn)
        .await?;

    for (order, tool) in draft.normalized_tools().iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO agent_tools (agent_id, tool_name, tool_order, is_active, created_at) VALUES (?, ?, ?, 1, ?)",
        )
        .bind(agent_id)
        .bind(tool)
        .bind(i64::try_from(order).unwrap_or(i64::MAX))
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Tags, custom features and tools loaded alongside an agent row.
#[derive(Default)]
struct Relations {
    categories: Vec<String>,
    agent_type: Option<String>,
    features: CustomFeatures,
    tools: Vec<AgentTool>,
}

async fn load_relations(conn: &mut SqliteConnection, agent_id: i64) -> DomainResult<Relations> {
    let mut relations = Relations::default();

    let tags: Vec<(String, String)> =
        sqlx::query_as("SELECT tag, tag_type FROM agent_tags WHERE agent_id = ? ORDER BY id")
            .bind(agent_id)
            .fetch_all(&mut *conn)
            .await?;
    for (tag, tag_type) in tags {
        match TagType::parse_str(&tag_type) {
            Some(TagType::Category) => relations.categories.push(tag),
            Some(TagType::Type) => relations.agent_type = Some(tag),
            Some(TagType::Label) | None => {}
        }
    }

    let configs: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT configuration_name, config_values FROM agent_configuration WHERE agent_id = ?",
    )
    .bind(agent_id)
    .fetch_all(&mut *conn)
    .await?;
    for (name, values) in configs {
        let Some(values) = values else { continue };
        let parsed = match name.as_str() {
            TOGGLE_CONFIG_NAME => serde_json::from_str(&values).map(|v| relations.features.toggle = Some(v)),
            DROPDOWN_CONFIG_NAME => serde_json::from_str(&values).map(|v| relations.features.dropdown = Some(v)),
            TEXT_CONFIG_NAME => serde_json::from_str(&values).map(|v| relations.features.text = Some(v)),
            _ => Ok(()),
        };
        if let Err(e) = parsed {
            tracing::warn!(agent_id, configuration = %name, error = %e, "skipping unreadable configuration");
        }
    }

    let tools: Vec<(String, i64, i64)> = sqlx::query_as(
        "SELECT tool_name, tool_order, is_active FROM agent_tools WHERE agent_id = ? ORDER BY tool_order, id",
    )
    .bind(agent_id)
    .fetch_all(&mut *conn)
    .await?;
    relations.tools = tools
        .into_iter()
        .map(|(tool_name, tool_order, is_active)| AgentTool {
            tool_name,
            tool_order: u32::try_from(tool_order).unwrap_or(0),
            is_active: is_active != 0,
        })
        .collect();

    Ok(relations)
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: i64,
    public_id: String,
    name: String,
    intro: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    mcp_url: Option<String>,
    health_url: Option<String>,
    is_enabled: i32,
    include_in_teams: i32,
    agent_header: Option<String>,
    instruction: Option<String>,
    agent_capabilities: Option<String>,
    add_history_to_context: i32,
    agent_metadata: Option<String>,
    health_status: String,
    last_health_check: Option<String>,
    is_deleted: i32,
    last_used: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AgentRow {
    fn into_agent(self, relations: Relations) -> DomainResult<Agent> {
        let public_id = super::parse_uuid(&self.public_id)?;

        let agent_header = self.agent_header.as_deref().and_then(|raw| {
            serde_json::from_str::<Value>(raw)
                .ok()
                .filter(|v| v.is_object() || v.is_array())
                .or_else(|| normalize_header(raw))
        });

        let agent_metadata = match self.agent_metadata.as_deref() {
            Some(raw) => match serde_json::from_str::<Map<String, Value>>(raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    tracing::warn!(agent_id = self.id, error = %e, "ignoring malformed agent_metadata");
                    None
                }
            },
            None => None,
        };

        Ok(Agent {
            id: self.id,
            public_id,
            name: self.name,
            intro: self.intro,
            description: self.description,
            icon: self.icon,
            mcp_url: self.mcp_url,
            health_url: self.health_url,
            is_enabled: self.is_enabled != 0,
            include_in_teams: self.include_in_teams != 0,
            agent_header,
            instruction: self.instruction,
            agent_capabilities: self.agent_capabilities,
            add_history_to_context: self.add_history_to_context != 0,
            agent_metadata,
            health_status: HealthStatus::parse_str(&self.health_status).unwrap_or_default(),
            last_health_check: super::parse_optional_datetime(self.last_health_check)?,
            is_deleted: self.is_deleted != 0,
            last_used: super::parse_optional_datetime(self.last_used)?,
            categories: relations.categories,
            agent_type: relations.agent_type,
            tools: relations.tools,
            features: relations.features,
            created_at: super::parse_datetime(&self.created_at)?,
            updated_at: super::parse_datetime(&self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{CustomFeatureToggle, ToggleField};

    async fn setup_test_repo() -> SqliteAgentRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteAgentRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_agent() {
        let repo = setup_test_repo().await;

        let mut draft = AgentDraft::new("Finance Helper")
            .with_categories(["Finance", "Reporting"])
            .with_instruction("Answer finance questions.");
        draft.tools = vec!["search".into(), "calculator".into()];
        draft.custom_feature_toggle = Some(CustomFeatureToggle {
            enabled: true,
            fields: vec![ToggleField {
                field_name: "deep_research".into(),
                is_default: false,
                field_icon: None,
            }],
        });
        draft.agent_header = Some("plain-token".into());

        let created = repo.create(&draft).await.unwrap();
        let fetched = repo.get_by_public_id(created.public_id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Finance Helper");
        assert_eq!(fetched.categories, vec!["Finance", "Reporting"]);
        assert_eq!(fetched.agent_type.as_deref(), Some(DEFAULT_AGENT_TYPE));
        assert_eq!(fetched.tools.len(), 2);
        assert_eq!(fetched.tools[1].tool_name, "calculator");
        assert_eq!(fetched.instruction.as_deref(), Some("Answer finance questions."));
        assert_eq!(fetched.agent_header, Some(serde_json::json!({"value": "plain-token"})));
        assert!(fetched.features.toggle.is_some());
        assert!(fetched.features.dropdown.is_none());
        assert!(fetched.is_enabled);
        assert!(!fetched.is_deleted);
    }

    #[tokio::test]
    async fn test_update_replaces_relations() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&AgentDraft::new("HR").with_categories(["People"]))
            .await
            .unwrap();

        let mut draft = AgentDraft::new("HR Assistant").with_categories(["Policies"]);
        draft.tools = vec!["lookup".into()];
        let updated = repo.update(created.public_id, &draft).await.unwrap();

        assert_eq!(updated.name, "HR Assistant");
        assert_eq!(updated.categories, vec!["Policies"]);
        assert_eq!(updated.tools.len(), 1);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_agent() {
        let repo = setup_test_repo().await;
        let err = repo.update(Uuid::new_v4(), &AgentDraft::new("x")).await.unwrap_err();
        assert!(matches!(err, DomainError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let repo = setup_test_repo().await;
        let keep = repo.create(&AgentDraft::new("Keep")).await.unwrap();
        let gone = repo.create(&AgentDraft::new("Gone")).await.unwrap();

        assert!(repo.soft_delete(gone.public_id).await.unwrap());
        assert!(!repo.soft_delete(gone.public_id).await.unwrap());

        let listed = repo.list(&AgentFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].public_id, keep.public_id);

        let all = repo
            .list(&AgentFilter {
                include_deleted: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let deleted = repo
            .find_deleted_among(&[keep.public_id, gone.public_id])
            .await
            .unwrap();
        assert_eq!(deleted, vec![gone.public_id]);

        let row = repo.get_by_public_id(gone.public_id).await.unwrap().unwrap();
        assert!(row.is_deleted);
    }

    #[tokio::test]
    async fn test_available_filter_and_paging() {
        let repo = setup_test_repo().await;
        for name in ["Alpha", "Bravo", "Charlie"] {
            repo.create(&AgentDraft::new(name).with_categories(["Ops"]))
                .await
                .unwrap();
        }
        repo.create(&AgentDraft::new("Delta").with_enabled(false).with_categories(["Ops"]))
            .await
            .unwrap();
        repo.create(&AgentDraft::new("Echo").with_categories(["Legal"]))
            .await
            .unwrap();

        let filter = AgentFilter::available(Some("Ops".into()), 2, 1);
        let page = repo.list(&filter).await.unwrap();
        assert_eq!(
            page.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            vec!["Bravo", "Charlie"]
        );
        assert_eq!(repo.count(&filter).await.unwrap(), 3);

        let all = AgentFilter::available(Some("ALL".into()), 20, 0);
        assert_eq!(repo.count(&all).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_name_taken_ignores_deleted_and_self() {
        let repo = setup_test_repo().await;
        let agent = repo.create(&AgentDraft::new("Legal")).await.unwrap();

        assert!(repo.name_taken("legal", None).await.unwrap());
        assert!(!repo.name_taken("Legal", Some(agent.public_id)).await.unwrap());

        repo.soft_delete(agent.public_id).await.unwrap();
        assert!(!repo.name_taken("Legal", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_category_summary() {
        let repo = setup_test_repo().await;
        repo.create(&AgentDraft::new("A").with_categories(["Finance"])).await.unwrap();
        repo.create(&AgentDraft::new("B").with_categories(["Finance", "HR"]).with_enabled(false))
            .await
            .unwrap();

        let summary = repo.category_summary().await.unwrap();
        assert_eq!(
            summary,
            vec![
                CategorySummary { name: "Finance".into(), agent_count: 2, enabled_count: 1 },
                CategorySummary { name: "HR".into(), agent_count: 1, enabled_count: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_usage_and_health_recording() {
        let repo = setup_test_repo().await;
        let agent = repo.create(&AgentDraft::new("Busy")).await.unwrap();
        let t0 = Utc::now() - chrono::Duration::days(2);
        let t1 = Utc::now();

        repo.record_usage(agent.public_id, t0).await.unwrap();
        repo.record_usage(agent.public_id, t1).await.unwrap();

        let all = repo.usage_stats(None, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].count, 2);

        let recent = repo
            .usage_stats(Some(Utc::now() - chrono::Duration::days(1)), None)
            .await
            .unwrap();
        assert_eq!(recent[0].count, 1);

        repo.record_health(agent.public_id, HealthStatus::Degraded, t1)
            .await
            .unwrap();
        let fetched = repo.get_by_public_id(agent.public_id).await.unwrap().unwrap();
        assert_eq!(fetched.health_status, HealthStatus::Degraded);
        assert!(fetched.last_health_check.is_some());
        assert!(fetched.last_used.is_some());
    }
}
