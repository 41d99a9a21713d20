//! Application services.
//!
//! Each service owns `Arc` handles to the ports it needs. Admin mutations
//! invalidate the listing cache after their repository call has committed.

pub mod agent_service;
pub mod analytics_service;
pub mod available_agents;
pub mod health_service;

pub use agent_service::AgentAdminService;
pub use analytics_service::{AnalyticsService, MAX_ANALYTICS_LIMIT};
pub use available_agents::{AvailableAgentsService, PageSource};
pub use health_service::{HealthCheckResult, HealthService, ProbeReport, SweepEntry, SweepSummary};
