//! Global invalidation counter port.

use async_trait::async_trait;

use crate::domain::ports::KvError;

/// Monotonic counter folded into every cache key.
#[async_trait]
pub trait VersionCounter: Send + Sync {
    /// Current value, initialising the counter to 1 when absent.
    async fn current(&self) -> Result<i64, KvError>;

    /// Atomically add one and return the new value.
    async fn increment(&self) -> Result<i64, KvError>;
}
