//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use agent_admin::adapters::cache::{AgentAvailableCache, InMemoryKvStore};
use agent_admin::adapters::sqlite::{
    create_migrated_test_pool, SqliteAgentRepository, SqliteAttachmentRepository,
};
use agent_admin::domain::models::{CacheConfig, ListingConfig};
use agent_admin::domain::ports::{KvError, KvStore};
use agent_admin::services::{AgentAdminService, AvailableAgentsService};

/// Create a temporary test database path.
///
/// Returns the path to a SQLite database file in a temporary directory.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    (dir, db_path)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A store that can be switched into failure mode mid-test.
#[derive(Default)]
pub struct FlakyKvStore {
    inner: InMemoryKvStore,
    down: AtomicBool,
}

impl FlakyKvStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Raw lookup that ignores expiry and failure mode.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key).await
    }

    fn check(&self) -> Result<(), KvError> {
        if self.down.load(Ordering::SeqCst) {
            Err(KvError::Unavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for FlakyKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        self.check()?;
        self.inner.set_ex(key, value, ttl_secs).await
    }

    async fn incr(&self, key: &str) -> Result<i64, KvError> {
        self.check()?;
        self.inner.incr(key).await
    }
}

/// Services over one in-memory database and one shared store.
pub struct Harness {
    pub repo: Arc<SqliteAgentRepository>,
    pub store: Arc<FlakyKvStore>,
    pub cache: Arc<AgentAvailableCache>,
    pub admin: AgentAdminService<SqliteAgentRepository, SqliteAttachmentRepository>,
    pub listing: AvailableAgentsService<SqliteAgentRepository>,
}

pub async fn harness() -> Harness {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create migrated pool");
    let repo = Arc::new(SqliteAgentRepository::new(pool.clone()));
    let attachments = Arc::new(SqliteAttachmentRepository::new(pool));
    let store = Arc::new(FlakyKvStore::default());
    let kv: Arc<dyn KvStore> = store.clone();
    let cache = Arc::new(AgentAvailableCache::new(Some(kv), &CacheConfig::default()));

    Harness {
        admin: AgentAdminService::new(repo.clone(), attachments, cache.clone()),
        listing: AvailableAgentsService::new(repo.clone(), cache.clone(), ListingConfig::default()),
        repo,
        store,
        cache,
    }
}
