//! Agent domain model.
//!
//! An agent is a configurable AI-assistant profile. Agents are addressed
//! externally by `public_id`; the numeric `id` is only used inside the
//! relational store. Deletion is soft: `is_deleted` hides the agent from
//! every listing while keeping the row and its related data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::custom_features::{
    CustomFeatureDropdown, CustomFeatureText, CustomFeatureToggle, CustomFeatures,
    CustomHeaderToggle,
};

/// Maximum length of an agent instruction prompt, in characters.
pub const MAX_INSTRUCTION_CHARS: usize = 20_000;
/// Maximum length of the routing capabilities text, in characters.
pub const MAX_CAPABILITIES_CHARS: usize = 5_000;
/// Maximum serialized size of `agent_metadata`, in bytes.
pub const MAX_METADATA_BYTES: usize = 100 * 1024;
/// Maximum length of an agent name.
pub const MAX_NAME_CHARS: usize = 200;
/// Category token reserved for "no category filter".
pub const RESERVED_CATEGORY: &str = "ALL";
/// Agent type assigned when a request leaves it unset.
pub const DEFAULT_AGENT_TYPE: &str = "Enterprise Agent";

/// Tag kinds stored in `agent_tags.tag_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Category,
    Type,
    Label,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Type => "type",
            Self::Label => "label",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "category" => Some(Self::Category),
            "type" => Some(Self::Type),
            "label" => Some(Self::Label),
            _ => None,
        }
    }
}

/// Last known health of an agent's endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unreachable,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Unreachable => "unreachable",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "healthy" => Some(Self::Healthy),
            "degraded" => Some(Self::Degraded),
            "unhealthy" => Some(Self::Unhealthy),
            "unreachable" => Some(Self::Unreachable),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Unhealthy for monitoring counts; degraded and unknown count as neither.
    pub fn is_failing(&self) -> bool {
        matches!(self, Self::Unhealthy | Self::Unreachable)
    }
}

/// A tool exposed by an agent, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTool {
    pub tool_name: String,
    pub tool_order: u32,
    pub is_active: bool,
}

/// A persisted agent with its tags, tools and custom features loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub intro: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub mcp_url: Option<String>,
    pub health_url: Option<String>,
    pub is_enabled: bool,
    pub include_in_teams: bool,
    pub agent_header: Option<Value>,
    pub instruction: Option<String>,
    pub agent_capabilities: Option<String>,
    pub add_history_to_context: bool,
    pub agent_metadata: Option<Map<String, Value>>,
    pub health_status: HealthStatus,
    pub last_health_check: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub last_used: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    pub agent_type: Option<String>,
    pub tools: Vec<AgentTool>,
    pub features: CustomFeatures,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// "active" or "inactive", derived from `is_enabled`.
    pub fn activity_status(&self) -> &'static str {
        if self.is_enabled {
            "active"
        } else {
            "inactive"
        }
    }

    /// URLs probed by the health sweep, labelled by source.
    pub fn probe_targets(&self) -> Vec<(&'static str, &str)> {
        let mut targets = Vec::new();
        if let Some(url) = self.mcp_url.as_deref().filter(|u| !u.trim().is_empty()) {
            targets.push(("mcp_url", url));
        }
        if let Some(url) = self.health_url.as_deref().filter(|u| !u.trim().is_empty()) {
            targets.push(("health_url", url));
        }
        targets
    }
}

const fn default_true() -> bool {
    true
}

/// Create or update request for an agent.
///
/// Field names follow the admin payload so a JSON request file can be fed
/// straight into the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub agent_name: String,
    #[serde(default)]
    pub agent_intro: Option<String>,
    /// Blob URL or attachment id.
    #[serde(default)]
    pub agent_icon: Option<String>,
    #[serde(default)]
    pub mcp_server_link: Option<String>,
    #[serde(default)]
    pub agent_health_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default = "default_true")]
    pub agent_enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub custom_feature_toggle: Option<CustomFeatureToggle>,
    #[serde(default)]
    pub custom_feature_dropdown: Option<CustomFeatureDropdown>,
    #[serde(default)]
    pub custom_feature_text: Option<CustomFeatureText>,
    #[serde(default)]
    pub custom_header_toggle: Option<CustomHeaderToggle>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub include_in_teams: bool,
    /// Header JSON as text.
    #[serde(default)]
    pub agent_header: Option<String>,
    #[serde(default)]
    pub agent_capabilities: Option<String>,
    #[serde(default)]
    pub add_history_to_context: bool,
    #[serde(default)]
    pub agent_metadata: Option<Map<String, Value>>,
}

impl AgentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            agent_name: name.into(),
            agent_enabled: true,
            ..Default::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.agent_health_url = Some(url.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.agent_enabled = enabled;
        self
    }

    pub fn features(&self) -> CustomFeatures {
        CustomFeatures {
            toggle: self.custom_feature_toggle.clone(),
            dropdown: self.custom_feature_dropdown.clone(),
            text: self.custom_feature_text.clone(),
        }
    }

    /// Category names, trimmed and de-duplicated in first-seen order.
    pub fn normalized_categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for category in &self.categories {
            let trimmed = category.trim();
            if !trimmed.is_empty() && !seen.iter().any(|c: &String| c == trimmed) {
                seen.push(trimmed.to_string());
            }
        }
        seen
    }

    /// Tool names, trimmed, empties dropped.
    pub fn normalized_tools(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Header value to store.
    ///
    /// An enabled header toggle wins over `agent_header`. Text that is not a
    /// JSON object or array is wrapped as `{"value": text}`.
    pub fn resolved_header(&self) -> Option<Value> {
        let raw = match &self.custom_header_toggle {
            Some(toggle) if toggle.enabled => toggle.value.as_deref(),
            _ => self.agent_header.as_deref(),
        };
        normalize_header(raw?)
    }

    pub fn validate(&self) -> Result<(), String> {
        let name = self.agent_name.trim();
        if name.is_empty() {
            return Err("agent_name cannot be empty".to_string());
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(format!("agent_name exceeds {MAX_NAME_CHARS} characters"));
        }
        if let Some(instruction) = &self.instruction {
            let len = instruction.chars().count();
            if len > MAX_INSTRUCTION_CHARS {
                return Err(format!(
                    "instruction exceeds maximum length: {len} characters, maximum allowed {MAX_INSTRUCTION_CHARS}"
                ));
            }
        }
        if let Some(capabilities) = &self.agent_capabilities {
            let len = capabilities.chars().count();
            if len > MAX_CAPABILITIES_CHARS {
                return Err(format!(
                    "agent_capabilities exceeds maximum length: {len} characters, maximum allowed {MAX_CAPABILITIES_CHARS}"
                ));
            }
        }
        if let Some(metadata) = &self.agent_metadata {
            let size = serde_json::to_vec(metadata).map_err(|e| e.to_string())?.len();
            if size > MAX_METADATA_BYTES {
                return Err(format!(
                    "agent_metadata exceeds maximum size: {size} bytes, maximum allowed {MAX_METADATA_BYTES}"
                ));
            }
        }
        if self
            .normalized_categories()
            .iter()
            .any(|c| c == RESERVED_CATEGORY)
        {
            return Err(format!("category name '{RESERVED_CATEGORY}' is reserved"));
        }
        self.features().validate()
    }
}

/// Parse header text into the stored JSON shape. Empty text is no header.
pub fn normalize_header(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => Some(serde_json::json!({ "value": trimmed })),
    }
}

/// Filter for admin listings.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub category: Option<String>,
    pub enabled_only: bool,
    pub include_deleted: bool,
    pub name_pattern: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl AgentFilter {
    /// Filter used by the user-facing available listing.
    pub fn available(category: Option<String>, limit: u32, offset: u32) -> Self {
        Self {
            category,
            enabled_only: true,
            include_deleted: false,
            name_pattern: None,
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_defaults_enabled() {
        let draft: AgentDraft = serde_json::from_str(r#"{"agent_name":"Finance"}"#).unwrap();
        assert!(draft.agent_enabled);
        assert!(draft.categories.is_empty());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_reserved_category() {
        let draft = AgentDraft::new("HR").with_categories(["People", "ALL"]);
        let err = draft.validate().unwrap_err();
        assert!(err.contains("reserved"));
    }

    #[test]
    fn test_validate_rejects_long_instruction() {
        let draft = AgentDraft::new("HR").with_instruction("x".repeat(MAX_INSTRUCTION_CHARS + 1));
        assert!(draft.validate().is_err());

        let draft = AgentDraft::new("HR").with_instruction("x".repeat(MAX_INSTRUCTION_CHARS));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_metadata() {
        let mut metadata = Map::new();
        metadata.insert("blob".into(), Value::String("y".repeat(MAX_METADATA_BYTES)));
        let mut draft = AgentDraft::new("HR");
        draft.agent_metadata = Some(metadata);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        assert!(AgentDraft::new("   ").validate().is_err());
    }

    #[test]
    fn test_normalized_categories_dedupes() {
        let draft = AgentDraft::new("x").with_categories([" Finance ", "Finance", "", "Legal"]);
        assert_eq!(draft.normalized_categories(), vec!["Finance", "Legal"]);
    }

    #[test]
    fn test_header_toggle_takes_precedence() {
        let mut draft = AgentDraft::new("x");
        draft.agent_header = Some(r#"{"A":"1"}"#.into());
        draft.custom_header_toggle = Some(CustomHeaderToggle {
            enabled: true,
            value: Some(r#"{"Authorization":"Bearer {mcp_token}"}"#.into()),
        });
        let header = draft.resolved_header().unwrap();
        assert_eq!(header["Authorization"], "Bearer {mcp_token}");

        draft.custom_header_toggle.as_mut().unwrap().enabled = false;
        assert_eq!(draft.resolved_header().unwrap()["A"], "1");
    }

    #[test]
    fn test_normalize_header_wraps_plain_text() {
        assert_eq!(
            normalize_header("token-abc"),
            Some(serde_json::json!({"value": "token-abc"}))
        );
        assert_eq!(normalize_header("  "), None);
        assert_eq!(normalize_header("[1,2]"), Some(serde_json::json!([1, 2])));
    }

    #[test]
    fn test_health_status_roundtrip_str() {
        for status in [
            HealthStatus::Healthy,
            HealthStatus::Degraded,
            HealthStatus::Unhealthy,
            HealthStatus::Unreachable,
            HealthStatus::Unknown,
        ] {
            assert_eq!(HealthStatus::parse_str(status.as_str()), Some(status));
        }
        assert!(HealthStatus::Unreachable.is_failing());
        assert!(!HealthStatus::Degraded.is_failing());
    }
}
