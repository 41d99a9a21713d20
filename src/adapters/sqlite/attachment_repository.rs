//! SQLite implementation of the AttachmentRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Attachment;
use crate::domain::ports::AttachmentRepository;

const ATTACHMENT_COLUMNS: &str = "id, user_id, file_name, file_size, content_type, blob_url, \
     blob_name, entity_type, entity_id, is_active, created_at";

#[derive(Clone)]
pub struct SqliteAttachmentRepository {
    pool: SqlitePool,
}

impl SqliteAttachmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for SqliteAttachmentRepository {
    async fn create(&self, attachment: &Attachment) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO attachments (id, user_id, file_name, file_size, content_type, blob_url,
               blob_name, entity_type, entity_id, is_active, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(attachment.id.to_string())
        .bind(attachment.user_id.to_string())
        .bind(&attachment.file_name)
        .bind(attachment.file_size)
        .bind(&attachment.content_type)
        .bind(&attachment.blob_url)
        .bind(&attachment.blob_name)
        .bind(&attachment.entity_type)
        .bind(&attachment.entity_id)
        .bind(i32::from(attachment.is_active))
        .bind(attachment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_active(&self, id: Uuid) -> DomainResult<Option<Attachment>> {
        let row: Option<AttachmentRow> = sqlx::query_as(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = ? AND is_active = 1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_active_many(&self, ids: &[Uuid]) -> DomainResult<Vec<Attachment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE is_active = 1 AND id IN ({placeholders})"
        );

        let mut q = sqlx::query_as::<_, AttachmentRow>(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: String,
    user_id: String,
    file_name: String,
    file_size: i64,
    content_type: Option<String>,
    blob_url: String,
    blob_name: String,
    entity_type: Option<String>,
    entity_id: Option<String>,
    is_active: i32,
    created_at: String,
}

impl TryFrom<AttachmentRow> for Attachment {
    type Error = DomainError;

    fn try_from(row: AttachmentRow) -> Result<Self, Self::Error> {
        Ok(Attachment {
            id: super::parse_uuid(&row.id)?,
            user_id: super::parse_uuid(&row.user_id)?,
            file_name: row.file_name,
            file_size: row.file_size,
            content_type: row.content_type,
            blob_url: row.blob_url,
            blob_name: row.blob_name,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            is_active: row.is_active != 0,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}
