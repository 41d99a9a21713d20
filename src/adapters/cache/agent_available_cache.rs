//! Read-through cache for the "available agents" listing.
//!
//! Keys embed a global version number. Invalidation bumps the version, so
//! every previously written key becomes unreachable at once; the abandoned
//! entries stay in the store until their TTL reclaims them. Nothing is ever
//! deleted.
//!
//! Every public method is total. Store failures, timeouts and bad payloads
//! are logged and surface as a miss, `false`, or version 1.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::version_counter::KvVersionCounter;
use crate::domain::models::{CacheConfig, RESERVED_CATEGORY};
use crate::domain::ports::{KvError, KvStore, VersionCounter};

/// Prefix shared by every listing key.
pub const KEY_NAMESPACE: &str = "agent_available";

/// Version reported when the counter cannot be read.
pub const FALLBACK_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache disabled")]
    Disabled,

    #[error(transparent)]
    Store(#[from] KvError),

    #[error("{op} timed out after {timeout_ms}ms")]
    Timeout { op: &'static str, timeout_ms: u128 },

    #[error("payload (de)serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Build the key for one listing request.
///
/// `None` and the reserved `"ALL"` token address the same unfiltered entry.
pub fn make_key(user_id: &str, category: Option<&str>, limit: u32, offset: u32, version: i64) -> String {
    let category = category
        .filter(|c| !c.is_empty())
        .unwrap_or(RESERVED_CATEGORY);
    format!("{KEY_NAMESPACE}:{user_id}:{category}:{limit}:{offset}:{version}")
}

/// Versioned invalidation cache over any [`KvStore`].
pub struct AgentAvailableCache {
    store: Option<Arc<dyn KvStore>>,
    counter: Option<Arc<dyn VersionCounter>>,
    default_ttl_secs: u64,
    op_timeout: Duration,
}

impl AgentAvailableCache {
    /// Cache over `store`. A missing store, or `enabled: false`, yields a
    /// disabled cache where every read misses.
    pub fn new(store: Option<Arc<dyn KvStore>>, config: &CacheConfig) -> Self {
        let store = store.filter(|_| config.enabled);
        let counter = store
            .clone()
            .map(|s| Arc::new(KvVersionCounter::new(s)) as Arc<dyn VersionCounter>);
        Self {
            store,
            counter,
            default_ttl_secs: config.ttl_secs,
            op_timeout: Duration::from_millis(config.op_timeout_ms),
        }
    }

    /// Cache with an injected version counter.
    pub fn with_counter(
        store: Arc<dyn KvStore>,
        counter: Arc<dyn VersionCounter>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store: Some(store),
            counter: Some(counter),
            default_ttl_secs: config.ttl_secs,
            op_timeout: Duration::from_millis(config.op_timeout_ms),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, &CacheConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, KvError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout {
                op,
                timeout_ms: self.op_timeout.as_millis(),
            }),
        }
    }

    async fn try_current_version(&self) -> Result<i64, CacheError> {
        let counter = self.counter.as_ref().ok_or(CacheError::Disabled)?;
        self.bounded("version read", counter.current()).await
    }

    async fn try_increment_version(&self) -> Result<i64, CacheError> {
        let counter = self.counter.as_ref().ok_or(CacheError::Disabled)?;
        self.bounded("version increment", counter.increment()).await
    }

    async fn try_get(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Option<String>, CacheError> {
        let store = self.store.as_ref().ok_or(CacheError::Disabled)?;
        let version = self.try_current_version().await?;
        let key = make_key(user_id, category, limit, offset, version);
        let value = self.bounded("get", store.get(&key)).await?;
        if value.is_some() {
            tracing::debug!(%key, "listing cache hit");
        } else {
            tracing::debug!(%key, "listing cache miss");
        }
        Ok(value)
    }

    #[allow(clippy::too_many_arguments)]
    async fn try_set(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
        payload: &str,
        ttl_secs: u64,
        version: Option<i64>,
    ) -> Result<String, CacheError> {
        let store = self.store.as_ref().ok_or(CacheError::Disabled)?;
        let version = match version {
            Some(version) => version,
            None => self.try_current_version().await?,
        };
        let key = make_key(user_id, category, limit, offset, version);
        self.bounded("setex", store.set_ex(&key, payload, ttl_secs))
            .await?;
        Ok(key)
    }

    /// Current version, initialising the counter to 1 when absent.
    pub async fn get_current_version(&self) -> i64 {
        match self.try_current_version().await {
            Ok(version) => version,
            Err(CacheError::Disabled) => FALLBACK_VERSION,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read listing cache version");
                FALLBACK_VERSION
            }
        }
    }

    /// Version to key a read-through fill under, taken before the source
    /// query runs. `None` when the cache is disabled or the counter cannot
    /// be read; the caller should then skip the fill.
    pub async fn fill_version(&self) -> Option<i64> {
        match self.try_current_version().await {
            Ok(version) => Some(version),
            Err(CacheError::Disabled) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read listing cache version; skipping fill");
                None
            }
        }
    }

    /// Atomically bump the version and return the new value.
    pub async fn increment_version(&self) -> i64 {
        match self.try_increment_version().await {
            Ok(version) => {
                tracing::info!(version, "listing cache version incremented");
                version
            }
            Err(CacheError::Disabled) => FALLBACK_VERSION,
            Err(e) => {
                tracing::error!(error = %e, "failed to increment listing cache version");
                FALLBACK_VERSION
            }
        }
    }

    /// Raw cached payload for a listing request under the current version.
    pub async fn get_cached_response(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Option<String> {
        match self.try_get(user_id, category, limit, offset).await {
            Ok(value) => value,
            Err(CacheError::Disabled) => None,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "listing cache read failed; treating as miss");
                None
            }
        }
    }

    /// Store a raw payload under the current version.
    ///
    /// `ttl_secs` of `None` uses the configured default.
    pub async fn set_cached_response(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
        payload: &str,
        ttl_secs: Option<u64>,
    ) -> bool {
        self.store_payload(user_id, category, limit, offset, payload, ttl_secs, None)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn store_payload(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
        payload: &str,
        ttl_secs: Option<u64>,
        version: Option<i64>,
    ) -> bool {
        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        match self
            .try_set(user_id, category, limit, offset, payload, ttl, version)
            .await
        {
            Ok(key) => {
                tracing::debug!(%key, ttl, "listing cached");
                true
            }
            Err(CacheError::Disabled) => false,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "listing cache write failed");
                false
            }
        }
    }

    /// Typed read. A payload that no longer deserializes counts as a miss.
    pub async fn get_cached<T: DeserializeOwned>(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Option<T> {
        let raw = self
            .get_cached_response(user_id, category, limit, offset)
            .await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, user_id, "discarding undecodable listing cache entry");
                None
            }
        }
    }

    /// Typed write under the current version.
    pub async fn set_cached<T: Serialize>(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
        payload: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        self.store_typed(user_id, category, limit, offset, payload, ttl_secs, None)
            .await
    }

    /// Typed write under a version read before the payload was built.
    ///
    /// If an invalidation landed in between, the entry goes under the old
    /// version and is never served.
    #[allow(clippy::too_many_arguments)]
    pub async fn set_cached_at<T: Serialize>(
        &self,
        version: i64,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
        payload: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        self.store_typed(user_id, category, limit, offset, payload, ttl_secs, Some(version))
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn store_typed<T: Serialize>(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: u32,
        offset: u32,
        payload: &T,
        ttl_secs: Option<u64>,
        version: Option<i64>,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match serde_json::to_string(payload) {
            Ok(raw) => {
                self.store_payload(user_id, category, limit, offset, &raw, ttl_secs, version)
                    .await
            }
            Err(e) => {
                let err = CacheError::from(e);
                tracing::warn!(error = %err, user_id, "listing payload not serializable");
                false
            }
        }
    }

    /// Invalidate every cached listing for every user.
    pub async fn invalidate_all(&self) -> i64 {
        self.increment_version().await
    }

    /// Per-user invalidation is not supported; only the global version
    /// exists. Logged and reported as `false`.
    pub async fn invalidate_user(&self, user_id: &str) -> bool {
        tracing::warn!(
            user_id,
            "per-user listing invalidation is not supported; use invalidate_all"
        );
        false
    }
}
