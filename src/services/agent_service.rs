//! Agent administration: create, update, soft delete.
//!
//! Every successful mutation is followed by a global listing invalidation.
//! The repository commits before returning, so invalidation always happens
//! after the new state is visible; a failed invalidation is only logged.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::cache::AgentAvailableCache;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, AgentDraft, AgentFilter};
use crate::domain::ports::{AgentRepository, AttachmentRepository};

pub struct AgentAdminService<R: AgentRepository, A: AttachmentRepository> {
    repository: Arc<R>,
    attachments: Arc<A>,
    cache: Arc<AgentAvailableCache>,
}

impl<R: AgentRepository, A: AttachmentRepository> AgentAdminService<R, A> {
    pub fn new(repository: Arc<R>, attachments: Arc<A>, cache: Arc<AgentAvailableCache>) -> Self {
        Self {
            repository,
            attachments,
            cache,
        }
    }

    pub async fn create_agent(&self, mut draft: AgentDraft) -> DomainResult<Agent> {
        draft.validate().map_err(DomainError::ValidationFailed)?;
        if self.repository.name_taken(&draft.agent_name, None).await? {
            return Err(DomainError::DuplicateAgentName(draft.agent_name.trim().to_string()));
        }

        self.resolve_icons(&mut draft).await?;
        let agent = self.repository.create(&draft).await?;

        self.invalidate_after_commit("create", agent.public_id).await;
        tracing::info!(agent_id = %agent.public_id, name = %agent.name, "agent created");
        Ok(agent)
    }

    pub async fn update_agent(&self, public_id: Uuid, mut draft: AgentDraft) -> DomainResult<Agent> {
        self.get_agent(public_id).await?;
        draft.validate().map_err(DomainError::ValidationFailed)?;
        if self
            .repository
            .name_taken(&draft.agent_name, Some(public_id))
            .await?
        {
            return Err(DomainError::DuplicateAgentName(draft.agent_name.trim().to_string()));
        }

        self.resolve_icons(&mut draft).await?;
        let agent = self.repository.update(public_id, &draft).await?;

        self.invalidate_after_commit("update", public_id).await;
        tracing::info!(agent_id = %public_id, "agent updated");
        Ok(agent)
    }

    pub async fn delete_agent(&self, public_id: Uuid) -> DomainResult<()> {
        let agent = self
            .repository
            .get_by_public_id(public_id)
            .await?
            .ok_or(DomainError::AgentNotFound(public_id))?;
        if agent.is_deleted {
            return Err(DomainError::AgentAlreadyDeleted(public_id));
        }

        if !self.repository.soft_delete(public_id).await? {
            // Lost a race with another delete.
            return Err(DomainError::AgentAlreadyDeleted(public_id));
        }

        self.invalidate_after_commit("delete", public_id).await;
        tracing::info!(agent_id = %public_id, "agent soft-deleted");
        Ok(())
    }

    /// A live agent; soft-deleted agents are not found.
    pub async fn get_agent(&self, public_id: Uuid) -> DomainResult<Agent> {
        self.repository
            .get_by_public_id(public_id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(DomainError::AgentNotFound(public_id))
    }

    pub async fn list_agents(&self, filter: &AgentFilter) -> DomainResult<Vec<Agent>> {
        self.repository.list(filter).await
    }

    /// Manual invalidation. Returns the new listing version.
    pub async fn invalidate_cache(&self) -> i64 {
        let version = self.cache.invalidate_all().await;
        tracing::info!(version, "listing cache invalidated manually");
        version
    }

    async fn invalidate_after_commit(&self, action: &'static str, public_id: Uuid) {
        let version = self.cache.invalidate_all().await;
        tracing::info!(action, agent_id = %public_id, version, "listing cache invalidated");
    }

    /// Replace attachment ids in icon fields with their blob URLs.
    ///
    /// Ids without an active attachment are kept as given.
    async fn resolve_icons(&self, draft: &mut AgentDraft) -> DomainResult<()> {
        let mut features = draft.features();
        let mut ids = features.attachment_icon_ids();
        if let Some(id) = draft
            .agent_icon
            .as_deref()
            .and_then(|icon| Uuid::parse_str(icon.trim()).ok())
        {
            ids.push(id);
        }
        if ids.is_empty() {
            return Ok(());
        }
        ids.sort();
        ids.dedup();

        let urls: HashMap<Uuid, String> = self
            .attachments
            .get_active_many(&ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a.blob_url))
            .collect();

        let resolve = |icon: &str| -> Option<String> {
            let id = Uuid::parse_str(icon.trim()).ok()?;
            let url = urls.get(&id).cloned();
            if url.is_none() {
                tracing::warn!(attachment_id = %id, "icon attachment not found; keeping id");
            }
            url
        };

        if let Some(icon) = draft.agent_icon.as_deref() {
            if let Some(url) = resolve(icon) {
                draft.agent_icon = Some(url);
            }
        }
        features.map_icons(resolve);

        draft.custom_feature_toggle = features.toggle;
        draft.custom_feature_dropdown = features.dropdown;
        draft.custom_feature_text = features.text;
        Ok(())
    }
}
