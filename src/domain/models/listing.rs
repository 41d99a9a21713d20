//! User-facing "available agents" page.
//!
//! This is the payload the listing cache stores. The cache treats it as an
//! opaque JSON string; only the listing service knows its shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::Agent;
use super::custom_features::CustomFeatures;

/// One agent as shown to end users. Admin-only fields are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableAgent {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub agent_intro: Option<String>,
    pub agent_icon: Option<String>,
    pub categories: Vec<String>,
    #[serde(default)]
    pub custom_features: CustomFeatures,
    pub last_used: Option<DateTime<Utc>>,
}

impl From<&Agent> for AvailableAgent {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.public_id,
            agent_name: agent.name.clone(),
            agent_intro: agent.intro.clone(),
            agent_icon: agent.icon.clone(),
            categories: agent.categories.clone(),
            custom_features: agent.features.clone(),
            last_used: agent.last_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableAgentsPage {
    pub success: bool,
    pub agents: Vec<AvailableAgent>,
    pub total_count: u64,
    pub has_more: bool,
}

impl AvailableAgentsPage {
    /// A page built from a successful query. Empty pages still succeed.
    pub fn new(agents: Vec<AvailableAgent>, total_count: u64, offset: u32) -> Self {
        let has_more = u64::from(offset) + (agents.len() as u64) < total_count;
        Self {
            success: true,
            agents,
            total_count,
            has_more,
        }
    }

    pub fn agent_ids(&self) -> Vec<Uuid> {
        self.agents.iter().map(|a| a.agent_id).collect()
    }
}
