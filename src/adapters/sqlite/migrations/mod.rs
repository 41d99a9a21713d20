//! Linear schema revision ledger for `SQLite`.
//!
//! Each [`Revision`] names its parent; the [`MigrationLedger`] checks the
//! graph is a single chain before anything runs, and the [`Migrator`] walks
//! it one committed step at a time.

mod ledger;
mod revisions;
mod runner;

use async_trait::async_trait;
use sqlx::SqliteConnection;
use thiserror::Error;

pub use ledger::{LedgerError, MigrationLedger};
pub use revisions::all_revisions;
pub use runner::{DowngradeOutcome, Migrator, RevisionStatus, UpgradeTarget};

/// How a revision behaves when rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowngradePolicy {
    /// The backward step restores the previous shape and data.
    Reversible,
    /// The backward step discards data or leaves the forward shape in place.
    Lossy { reason: &'static str },
}

impl DowngradePolicy {
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Lossy { .. })
    }
}

/// One step of the schema history.
///
/// `upgrade` must be safe to run on a schema that already has its changes.
#[async_trait]
pub trait Revision: Send + Sync {
    fn id(&self) -> &'static str;

    /// `None` only for the root revision.
    fn parent(&self) -> Option<&'static str>;

    fn description(&self) -> &'static str;

    fn downgrade_policy(&self) -> DowngradePolicy {
        DowngradePolicy::Reversible
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    async fn downgrade(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Invalid revision graph: {0}")]
    InvalidGraph(#[from] LedgerError),

    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    #[error("Target {target} is behind current revision {current}; use downgrade")]
    TargetBehindCursor { target: String, current: String },

    #[error("Revision {revision} failed: {source}")]
    StepFailed {
        revision: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to read or create the revision cursor: {0}")]
    Cursor(#[source] sqlx::Error),
}
