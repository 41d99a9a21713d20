//! Attachment repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Attachment;

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create(&self, attachment: &Attachment) -> DomainResult<()>;

    /// Active attachment by id; inactive rows resolve to `None`.
    async fn get_active(&self, id: Uuid) -> DomainResult<Option<Attachment>>;

    /// Active attachments among `ids`, in no particular order.
    async fn get_active_many(&self, ids: &[Uuid]) -> DomainResult<Vec<Attachment>>;
}
