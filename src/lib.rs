pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod components;
pub mod config;
pub mod controller;
pub mod env;
pub mod error;
pub mod logging;
pub mod memory;
pub mod pages;
pub mod preference;
pub mod theme;

pub use config::ThemeConfig;
pub use controller::{IgnoreReason, InitialSource, Reconciliation, Subscription, ThemeController};
pub use env::{ColorSchemeSource, PreferenceStore, PresentationRoot, ThemeEnvironment, ThemeEvent};
pub use error::ThemeError;
pub use preference::ThemePreference;
pub use theme::{use_theme, ThemeContext, ThemeProvider};
