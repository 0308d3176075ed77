use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ThemeError;

/// The two themes a user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Value written to the preference store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemePreference::Dark)
    }

    /// Map an OS color-scheme signal onto a preference.
    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            ThemePreference::Dark
        } else {
            ThemePreference::Light
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemePreference::Light => "Light",
            ThemePreference::Dark => "Dark",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only the exact stored spellings are accepted.
impl FromStr for ThemePreference {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(ThemeError::Validation {
                value: other.to_string(),
            }),
        }
    }
}
