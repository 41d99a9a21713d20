//! Domain errors for the agent administration backend.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while managing agents.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Agent not found: {0}")]
    AgentNotFound(Uuid),

    #[error("Agent already deleted: {0}")]
    AgentAlreadyDeleted(Uuid),

    #[error("Agent name already in use: {0}")]
    DuplicateAgentName(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::SerializationError(_)));
    }

    #[test]
    fn test_not_found_message_includes_id() {
        let id = Uuid::new_v4();
        let msg = DomainError::AgentNotFound(id).to_string();
        assert!(msg.contains(&id.to_string()));
    }
}
