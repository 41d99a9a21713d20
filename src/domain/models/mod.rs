pub mod agent;
pub mod analytics;
pub mod attachment;
pub mod config;
pub mod custom_features;
pub mod listing;

pub use agent::{
    normalize_header, Agent, AgentDraft, AgentFilter, AgentTool, HealthStatus, TagType,
    DEFAULT_AGENT_TYPE, MAX_CAPABILITIES_CHARS, MAX_INSTRUCTION_CHARS, MAX_METADATA_BYTES,
    RESERVED_CATEGORY,
};
pub use analytics::{
    format_usage, AgentUsage, AnalyticsItem, AnalyticsQuery, AnalyticsReport, AnalyticsSort,
    CategorySummary, MonitoringItem, MonitoringReport, SortOrder,
};
pub use attachment::Attachment;
pub use config::{
    CacheBackend, CacheConfig, Config, DatabaseConfig, HealthConfig, ListingConfig, LoggingConfig,
};
pub use custom_features::{
    CustomFeatureDropdown, CustomFeatureText, CustomFeatureToggle, CustomFeatures,
    CustomHeaderToggle, DropdownField, DropdownOption, TextField, ToggleField,
};
pub use listing::{AvailableAgent, AvailableAgentsPage};
