//! In-process key-value store.
//!
//! A `HashMap` behind a tokio mutex. Expiry is checked on access, and writes
//! sweep out every expired entry at most once per [`SWEEP_INTERVAL`], so keys
//! orphaned by a version bump are reclaimed without ever being read again.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::domain::ports::{KvError, KvStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Minimum time between two expiry sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Entries {
    map: HashMap<String, Entry>,
    last_sweep: Instant,
}

impl Entries {
    fn insert(&mut self, key: &str, entry: Entry, now: Instant) {
        if now.duration_since(self.last_sweep) >= SWEEP_INTERVAL {
            let before = self.map.len();
            self.map.retain(|_, e| e.is_live(now));
            self.last_sweep = now;
            let swept = before - self.map.len();
            if swept > 0 {
                tracing::debug!(swept, remaining = self.map.len(), "expired keys swept");
            }
        }
        self.map.insert(key.to_string(), entry);
    }
}

#[derive(Debug)]
pub struct InMemoryKvStore {
    entries: Mutex<Entries>,
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.map.is_empty()
    }

    /// Raw lookup that ignores expiry.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().await.map.contains_key(key)
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.map.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let now = Instant::now();
        self.entries.lock().await.insert(
            key,
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
            now,
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        if ttl_secs == 0 {
            return Err(KvError::Command("invalid expire time in 'setex' command".to_string()));
        }
        let now = Instant::now();
        self.entries.lock().await.insert(
            key,
            Entry {
                value: value.to_string(),
                expires_at: Some(now + Duration::from_secs(ttl_secs)),
            },
            now,
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, KvError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let (current, expires_at) = match entries.map.get(key) {
            Some(entry) if entry.is_live(now) => {
                let current = entry
                    .value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| KvError::NotAnInteger { key: key.to_string() })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| KvError::Command("increment or decrement would overflow".to_string()))?;
        entries.insert(
            key,
            Entry {
                value: next.to_string(),
                expires_at,
            },
            now,
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_starts_at_one() {
        let store = InMemoryKvStore::new();
        assert_eq!(store.incr("counter").await.unwrap(), 1);
        assert_eq!(store.incr("counter").await.unwrap(), 2);
        assert_eq!(store.get("counter").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let store = InMemoryKvStore::new();
        store.set("k", "abc").await.unwrap();
        assert!(matches!(
            store.incr("k").await,
            Err(KvError::NotAnInteger { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_ex_expires() {
        let store = InMemoryKvStore::new();
        store.set_ex("k", "v", 1).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        std::thread::sleep(Duration::from_millis(1100));
        assert!(store.get("k").await.unwrap().is_none());
        assert!(!store.contains_key("k").await);
    }

    #[tokio::test]
    async fn test_set_ex_rejects_zero_ttl() {
        let store = InMemoryKvStore::new();
        assert!(store.set_ex("k", "v", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_set_clears_expiry() {
        let store = InMemoryKvStore::new();
        store.set_ex("k", "v", 60).await.unwrap();
        store.set("k", "w").await.unwrap();
        let entries = store.entries.lock().await;
        assert!(entries.map.get("k").unwrap().expires_at.is_none());
    }

    #[tokio::test]
    async fn test_writes_reclaim_orphaned_entries() {
        let store = InMemoryKvStore::new();
        for version in 1..=50 {
            store
                .set_ex(&format!("listing:u1:{version}"), "page", 1)
                .await
                .unwrap();
            store.incr("version").await.unwrap();
        }
        assert_eq!(store.len().await, 51);

        tokio::time::sleep(SWEEP_INTERVAL + Duration::from_millis(200)).await;
        store.set_ex("listing:u1:51", "page", 60).await.unwrap();

        // Only the counter and the fresh entry survive.
        assert_eq!(store.len().await, 2);
        assert!(!store.contains_key("listing:u1:1").await);
        assert!(store.contains_key("version").await);
    }
}
