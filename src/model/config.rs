use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the key hint line in the status row
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// List title used when none has been stored yet
    #[serde(default = "default_list_title")]
    pub default_list_title: String,
    /// Color overrides keyed by theme slot name (e.g. "background" = "#0C001B")
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            default_list_title: default_list_title(),
            colors: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

pub const DEFAULT_LIST_TITLE: &str = "My Tasks";

fn default_list_title() -> String {
    DEFAULT_LIST_TITLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.ui.show_key_hints);
        assert_eq!(config.ui.default_list_title, DEFAULT_LIST_TITLE);
        assert!(config.ui.colors.is_empty());
    }

    #[test]
    fn partial_ui_table() {
        let config: AppConfig = toml::from_str(
            "[ui]\nshow_key_hints = false\n\n[ui.colors]\nbackground = \"#000000\"\n",
        )
        .unwrap();
        assert!(!config.ui.show_key_hints);
        assert_eq!(config.ui.default_list_title, DEFAULT_LIST_TITLE);
        assert_eq!(config.ui.colors.get("background").unwrap(), "#000000");
    }
}
