//! Listing cache: key-value stores, the version counter and the versioned
//! read-through cache built on them.

pub mod agent_available_cache;
pub mod memory_store;
pub mod redis_store;
pub mod version_counter;

pub use agent_available_cache::{make_key, AgentAvailableCache, CacheError, FALLBACK_VERSION, KEY_NAMESPACE};
pub use memory_store::InMemoryKvStore;
pub use redis_store::RedisKvStore;
pub use version_counter::{KvVersionCounter, GLOBAL_VERSION_KEY};
