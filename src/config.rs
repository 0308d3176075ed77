use serde::{Deserialize, Serialize};

use crate::error::ThemeError;
use crate::preference::ThemePreference;

pub const DEFAULT_STORAGE_KEY: &str = "theme_sync_theme";
pub const DEFAULT_DARK_CLASS: &str = "dark";
pub const DEFAULT_COLOR_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

/// Settings for one theme controller. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Namespaced key in the origin's preference store.
    pub storage_key: String,
    /// Class toggled on the document root while the dark theme is active.
    pub dark_class: String,
    /// Media query reporting the OS color-scheme preference.
    pub color_scheme_query: String,
    /// Used when nothing is persisted and the OS reports nothing.
    pub default_theme: ThemePreference,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            dark_class: DEFAULT_DARK_CLASS.to_string(),
            color_scheme_query: DEFAULT_COLOR_SCHEME_QUERY.to_string(),
            default_theme: ThemePreference::Light,
        }
    }
}

impl ThemeConfig {
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        let config: ThemeConfig =
            serde_json::from_str(json).map_err(|e| ThemeError::Config(e.to_string()))?;

        if config.storage_key.trim().is_empty() {
            return Err(ThemeError::Config("storage_key must not be empty".to_string()));
        }
        if config.dark_class.trim().is_empty() || config.dark_class.contains(char::is_whitespace) {
            return Err(ThemeError::Config(format!(
                "dark_class must be a single class name, got {:?}",
                config.dark_class
            )));
        }
        Ok(config)
    }
}
