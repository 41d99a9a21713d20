//! Agent Admin - agent administration backend
//!
//! Manages AI agent definitions (tags, tools, custom features, attachments),
//! serves a cached "available agents" listing, and evolves its SQLite schema
//! through a linear revision ledger.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): SQLite repositories and migrations, key-value
//!   stores behind the listing cache, HTTP health probing
//! - **Service Layer** (`services`): admin mutations, cached listing,
//!   analytics and health checks
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Cache invalidation
//!
//! Listing entries are keyed by a global version. Admin mutations commit
//! first and then bump the version, so later reads build new keys and old
//! entries age out through their TTL.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::cache::{make_key, AgentAvailableCache, InMemoryKvStore, RedisKvStore};
pub use adapters::sqlite::{
    initialize_database, MigrationLedger, Migrator, Revision, SqliteAgentRepository,
    SqliteAttachmentRepository, UpgradeTarget,
};
pub use domain::models::{
    Agent, AgentDraft, AgentFilter, AvailableAgentsPage, CacheConfig, Config, HealthStatus,
};
pub use domain::ports::{AgentRepository, AttachmentRepository, KvStore, VersionCounter};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AgentAdminService, AnalyticsService, AvailableAgentsService, HealthService};
