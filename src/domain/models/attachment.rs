//! Uploaded file reference used for agent and custom feature icons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    /// Full blob URL, including any access token.
    pub blob_url: String,
    pub blob_name: String,
    /// Owning entity kind, e.g. "agent".
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    pub fn new(
        user_id: Uuid,
        file_name: impl Into<String>,
        blob_url: impl Into<String>,
        blob_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            file_name: file_name.into(),
            file_size: 0,
            content_type: None,
            blob_url: blob_url.into(),
            blob_name: blob_name.into(),
            entity_type: None,
            entity_id: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn for_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }
}
