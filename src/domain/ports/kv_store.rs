//! Key-value store port used by the listing cache.
//!
//! Only four primitives are needed. Anything that can honour them
//! atomically (Redis, a mutex-guarded map) can back the cache.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("value at {key} is not an integer")]
    NotAnInteger { key: String },
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Set with expiry in seconds.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError>;

    /// Atomic increment by one. An absent key counts as 0, so the first
    /// call returns 1.
    async fn incr(&self, key: &str) -> Result<i64, KvError>;
}
