//! Custom feature configuration attached to an agent.
//!
//! Each collection (toggle, dropdown, text) is persisted as one JSON blob in
//! `agent_configuration`, keyed by its configuration name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Configuration name under which toggle fields are stored.
pub const TOGGLE_CONFIG_NAME: &str = "custom_feature_toggle";
/// Configuration name under which dropdown fields are stored.
pub const DROPDOWN_CONFIG_NAME: &str = "custom_feature_dropdown";
/// Configuration name under which text fields are stored.
pub const TEXT_CONFIG_NAME: &str = "custom_feature_text";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleField {
    pub field_name: String,
    #[serde(default)]
    pub is_default: bool,
    /// Icon URL or attachment id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFeatureToggle {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<ToggleField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub title_name: String,
    pub value: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownField {
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_icon: Option<String>,
    #[serde(default)]
    pub options: Vec<DropdownOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFeatureDropdown {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<DropdownField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextField {
    pub field_name: String,
    pub field_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFeatureText {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<TextField>,
}

/// Header toggle; when enabled, `value` becomes the agent's stored header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHeaderToggle {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub value: Option<String>,
}

/// All custom feature collections of one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<CustomFeatureToggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown: Option<CustomFeatureDropdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<CustomFeatureText>,
}

impl CustomFeatures {
    pub fn is_empty(&self) -> bool {
        self.toggle.is_none() && self.dropdown.is_none() && self.text.is_none()
    }

    /// Every icon reference in the configuration that parses as an
    /// attachment id, in field order.
    pub fn attachment_icon_ids(&self) -> Vec<Uuid> {
        let mut icons: Vec<&str> = Vec::new();
        if let Some(toggle) = &self.toggle {
            icons.extend(toggle.fields.iter().filter_map(|f| f.field_icon.as_deref()));
        }
        if let Some(dropdown) = &self.dropdown {
            for field in &dropdown.fields {
                icons.extend(field.field_icon.as_deref());
                icons.extend(field.options.iter().filter_map(|o| o.option_icon.as_deref()));
            }
        }
        icons.into_iter().filter_map(|s| Uuid::parse_str(s).ok()).collect()
    }

    /// Rewrite every icon reference through `resolve`.
    ///
    /// `resolve` returns `None` to leave the icon untouched.
    pub fn map_icons<F>(&mut self, mut resolve: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut apply = |icon: &mut Option<String>| {
            if let Some(current) = icon.as_deref() {
                if let Some(resolved) = resolve(current) {
                    *icon = Some(resolved);
                }
            }
        };

        if let Some(toggle) = &mut self.toggle {
            for field in &mut toggle.fields {
                apply(&mut field.field_icon);
            }
        }
        if let Some(dropdown) = &mut self.dropdown {
            for field in &mut dropdown.fields {
                apply(&mut field.field_icon);
                for option in &mut field.options {
                    apply(&mut option.option_icon);
                }
            }
        }
    }

    /// Validate structural constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(toggle) = &self.toggle {
            if toggle.fields.iter().any(|f| f.field_name.trim().is_empty()) {
                return Err("toggle field_name cannot be empty".to_string());
            }
        }
        if let Some(dropdown) = &self.dropdown {
            for field in &dropdown.fields {
                if field.field_name.trim().is_empty() {
                    return Err("dropdown field_name cannot be empty".to_string());
                }
                if field.options.iter().filter(|o| o.is_default).count() > 1 {
                    return Err(format!(
                        "dropdown field '{}' has more than one default option",
                        field.field_name
                    ));
                }
            }
        }
        if let Some(text) = &self.text {
            if text.fields.iter().any(|f| f.field_name.trim().is_empty()) {
                return Err("text field_name cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CustomFeatures {
        let icon = Uuid::new_v4();
        CustomFeatures {
            toggle: Some(CustomFeatureToggle {
                enabled: true,
                fields: vec![ToggleField {
                    field_name: "web_search".into(),
                    is_default: true,
                    field_icon: Some(icon.to_string()),
                }],
            }),
            dropdown: Some(CustomFeatureDropdown {
                enabled: true,
                fields: vec![DropdownField {
                    field_name: "tone".into(),
                    field_icon: Some("https://cdn.example/tone.png".into()),
                    options: vec![
                        DropdownOption {
                            title_name: "Formal".into(),
                            value: "formal".into(),
                            is_default: true,
                            option_icon: None,
                        },
                        DropdownOption {
                            title_name: "Casual".into(),
                            value: "casual".into(),
                            is_default: false,
                            option_icon: Some(icon.to_string()),
                        },
                    ],
                }],
            }),
            text: None,
        }
    }

    #[test]
    fn test_attachment_icon_ids_skips_urls() {
        let features = sample();
        let ids = features.attachment_icon_ids();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_map_icons_rewrites_matches_only() {
        let mut features = sample();
        features.map_icons(|icon| {
            Uuid::parse_str(icon)
                .ok()
                .map(|_| "https://blob.example/icon.png".to_string())
        });

        let toggle = features.toggle.as_ref().unwrap();
        assert_eq!(
            toggle.fields[0].field_icon.as_deref(),
            Some("https://blob.example/icon.png")
        );
        let dropdown = features.dropdown.as_ref().unwrap();
        assert_eq!(
            dropdown.fields[0].field_icon.as_deref(),
            Some("https://cdn.example/tone.png")
        );
        assert_eq!(
            dropdown.fields[0].options[1].option_icon.as_deref(),
            Some("https://blob.example/icon.png")
        );
    }

    #[test]
    fn test_validate_rejects_two_default_options() {
        let mut features = sample();
        features.dropdown.as_mut().unwrap().fields[0].options[1].is_default = true;
        assert!(features.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let toggle: CustomFeatureToggle =
            serde_json::from_str(r#"{"fields":[{"field_name":"x"}]}"#).unwrap();
        assert!(!toggle.enabled);
        assert!(!toggle.fields[0].is_default);
        assert!(toggle.fields[0].field_icon.is_none());
    }
}
