//! Version counter stored under a single key of a `KvStore`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::ports::{KvError, KvStore, VersionCounter};

/// Key holding the global listing version.
pub const GLOBAL_VERSION_KEY: &str = "agent_available:global_version";

/// Counter built from `GET` and `INCR` only.
///
/// When the key is absent, `INCR` creates it at 1 atomically, which doubles
/// as initialisation. Two readers racing on an absent key may both `INCR`;
/// the counter then starts at 2, which costs one extra round of misses and
/// never moves backwards.
pub struct KvVersionCounter {
    store: Arc<dyn KvStore>,
    key: String,
}

impl KvVersionCounter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_key(store, GLOBAL_VERSION_KEY)
    }

    pub fn with_key(store: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl VersionCounter for KvVersionCounter {
    async fn current(&self) -> Result<i64, KvError> {
        match self.store.get(&self.key).await? {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| KvError::NotAnInteger {
                key: self.key.clone(),
            }),
            None => {
                let initial = self.store.incr(&self.key).await?;
                tracing::info!(version = initial, key = %self.key, "initialized listing version");
                Ok(initial)
            }
        }
    }

    async fn increment(&self) -> Result<i64, KvError> {
        self.store.incr(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryKvStore;

    #[tokio::test]
    async fn test_current_initializes_to_one() {
        let store = Arc::new(InMemoryKvStore::new());
        let counter = KvVersionCounter::new(store.clone());

        assert_eq!(counter.current().await.unwrap(), 1);
        assert_eq!(counter.current().await.unwrap(), 1);
        assert_eq!(
            store.get(GLOBAL_VERSION_KEY).await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_increment_then_current() {
        let counter = KvVersionCounter::new(Arc::new(InMemoryKvStore::new()));
        assert_eq!(counter.current().await.unwrap(), 1);
        assert_eq!(counter.increment().await.unwrap(), 2);
        assert_eq!(counter.current().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_counter_is_an_error() {
        let store = Arc::new(InMemoryKvStore::new());
        store.set(GLOBAL_VERSION_KEY, "seven").await.unwrap();
        let counter = KvVersionCounter::new(store);
        assert!(counter.current().await.is_err());
    }
}
