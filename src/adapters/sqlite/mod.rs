//! SQLite adapters: pool setup, the revision ledger and repositories.

pub mod agent_repository;
pub mod attachment_repository;
pub mod connection;
pub mod migrations;
pub mod schema;

pub use agent_repository::SqliteAgentRepository;
pub use attachment_repository::SqliteAttachmentRepository;
pub use connection::{
    create_pool, create_test_pool, database_url, verify_connection, ConnectionError, PoolConfig,
};
pub use migrations::{
    all_revisions, DowngradeOutcome, DowngradePolicy, LedgerError, MigrationError, MigrationLedger,
    Migrator, Revision, RevisionStatus, UpgradeTarget,
};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an optional RFC3339 datetime string from a SQLite row field.
pub fn parse_optional_datetime(s: Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    s.map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| DomainError::SerializationError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Migrator over the application's full revision chain.
pub fn default_migrator(pool: SqlitePool) -> Result<Migrator, MigrationError> {
    let ledger = MigrationLedger::new(all_revisions())?;
    Ok(Migrator::new(pool, ledger))
}

/// Open the database and bring the schema to head.
pub async fn initialize_database(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    let applied = default_migrator(pool.clone())?.upgrade(UpgradeTarget::Head).await?;
    if applied > 0 {
        tracing::info!(applied, "database schema upgraded");
    }
    Ok(pool)
}

/// Create an in-memory test pool with all revisions applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    default_migrator(pool.clone())?.upgrade(UpgradeTarget::Head).await?;
    Ok(pool)
}
