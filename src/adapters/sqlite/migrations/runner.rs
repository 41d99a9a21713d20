use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use super::{MigrationError, MigrationLedger};

/// How far `upgrade` should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeTarget {
    Head,
    Revision(String),
}

/// One rolled-back revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DowngradeOutcome {
    pub revision: String,
    /// Set when the backward step could not fully restore the prior state.
    pub lossy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionStatus {
    pub id: String,
    pub parent: Option<String>,
    pub description: String,
    pub applied: bool,
    pub current: bool,
    pub lossy_downgrade: bool,
}

/// Applies a [`MigrationLedger`] to a database, tracking progress in a
/// single-row `schema_revision` table.
///
/// Each step and its cursor update share one transaction. A failing step
/// rolls back alone and leaves the cursor on the last committed revision.
/// Only one runner may work on a database at a time.
pub struct Migrator {
    pool: SqlitePool,
    ledger: MigrationLedger,
}

impl Migrator {
    pub fn new(pool: SqlitePool, ledger: MigrationLedger) -> Self {
        Self { pool, ledger }
    }

    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    async fn ensure_cursor_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_revision (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                revision TEXT,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(MigrationError::Cursor)?;
        Ok(())
    }

    /// The persisted cursor; `None` before the first upgrade.
    pub async fn current_revision(&self) -> Result<Option<String>, MigrationError> {
        self.ensure_cursor_table().await?;
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT revision FROM schema_revision WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(MigrationError::Cursor)?;
        Ok(row.and_then(|(revision,)| revision))
    }

    /// Chain index of the cursor, or `None` at base.
    async fn current_index(&self) -> Result<Option<usize>, MigrationError> {
        match self.current_revision().await? {
            Some(id) => self
                .ledger
                .position(&id)
                .map(Some)
                .ok_or(MigrationError::UnknownRevision(id)),
            None => Ok(None),
        }
    }

    /// Apply pending revisions up to `target`. Returns how many ran.
    pub async fn upgrade(&self, target: UpgradeTarget) -> Result<usize, MigrationError> {
        let current = self.current_index().await?;
        let target_index = match &target {
            UpgradeTarget::Head => match self.ledger.len().checked_sub(1) {
                Some(index) => index,
                None => return Ok(0),
            },
            UpgradeTarget::Revision(id) => self
                .ledger
                .position(id)
                .ok_or_else(|| MigrationError::UnknownRevision(id.clone()))?,
        };

        if let Some(current) = current {
            if target_index < current {
                return Err(MigrationError::TargetBehindCursor {
                    target: self.ledger.ids()[target_index].to_string(),
                    current: self.ledger.ids()[current].to_string(),
                });
            }
        }

        let start = current.map_or(0, |c| c + 1);
        let mut applied = 0;
        for index in start..=target_index {
            let Some(revision) = self.ledger.get(index) else {
                break;
            };
            let step_failed = |source| MigrationError::StepFailed {
                revision: revision.id().to_string(),
                source,
            };

            let mut tx = self.pool.begin().await.map_err(step_failed)?;
            revision.upgrade(&mut tx).await.map_err(step_failed)?;
            write_cursor(&mut tx, Some(revision.id()))
                .await
                .map_err(step_failed)?;
            tx.commit().await.map_err(step_failed)?;

            tracing::info!(
                revision = revision.id(),
                description = revision.description(),
                "applied schema revision"
            );
            applied += 1;
        }

        Ok(applied)
    }

    /// Roll back up to `steps` revisions, newest first. Stops early at base.
    pub async fn downgrade(&self, steps: usize) -> Result<Vec<DowngradeOutcome>, MigrationError> {
        let mut outcomes = Vec::new();
        for _ in 0..steps {
            let Some(index) = self.current_index().await? else {
                tracing::info!("schema already at base revision");
                break;
            };
            let Some(revision) = self.ledger.get(index) else {
                break;
            };
            let step_failed = |source| MigrationError::StepFailed {
                revision: revision.id().to_string(),
                source,
            };

            let mut tx = self.pool.begin().await.map_err(step_failed)?;
            revision.downgrade(&mut tx).await.map_err(step_failed)?;
            write_cursor(&mut tx, revision.parent())
                .await
                .map_err(step_failed)?;
            tx.commit().await.map_err(step_failed)?;

            let policy = revision.downgrade_policy();
            if let super::DowngradePolicy::Lossy { reason } = policy {
                tracing::warn!(
                    revision = revision.id(),
                    reason,
                    "lossy downgrade: prior state not fully restored"
                );
            } else {
                tracing::info!(revision = revision.id(), "reverted schema revision");
            }

            outcomes.push(DowngradeOutcome {
                revision: revision.id().to_string(),
                lossy: policy.is_lossy(),
            });
        }
        Ok(outcomes)
    }

    /// Every revision in chain order with its applied state.
    pub async fn status(&self) -> Result<Vec<RevisionStatus>, MigrationError> {
        let current = self.current_index().await?;
        Ok(self
            .ledger
            .iter()
            .enumerate()
            .map(|(index, revision)| RevisionStatus {
                id: revision.id().to_string(),
                parent: revision.parent().map(str::to_string),
                description: revision.description().to_string(),
                applied: current.is_some_and(|c| index <= c),
                current: current == Some(index),
                lossy_downgrade: revision.downgrade_policy().is_lossy(),
            })
            .collect())
    }
}

async fn write_cursor(conn: &mut SqliteConnection, revision: Option<&str>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO schema_revision (id, revision, updated_at) VALUES (1, ?, ?)
         ON CONFLICT(id) DO UPDATE SET revision = excluded.revision, updated_at = excluded.updated_at",
    )
    .bind(revision)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
