//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters implement:
//! - AgentRepository: relational persistence for agents
//! - AttachmentRepository: uploaded icon lookups
//! - KvStore: the four key-value primitives behind the listing cache
//! - VersionCounter: the global invalidation counter
//! - HealthProbe: HTTP reachability checks

pub mod agent_repository;
pub mod attachment_repository;
pub mod health_probe;
pub mod kv_store;
pub mod version_counter;

pub use agent_repository::AgentRepository;
pub use attachment_repository::AttachmentRepository;
pub use health_probe::{HealthProbe, ProbeOutcome};
pub use kv_store::{KvError, KvStore};
pub use version_counter::VersionCounter;
