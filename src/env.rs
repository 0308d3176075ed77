//! Collaborators the theme controller talks to.
//!
//! In a browser these are `localStorage`, the `<html>` element and a
//! `matchMedia` query (see `crate::browser`). Tests and native builds use the
//! in-memory versions from `crate::memory`.

use std::rc::Rc;

use crate::error::ThemeError;
use crate::preference::ThemePreference;

/// Origin-scoped key-value store shared by every tab.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ThemeError>;
}

/// The document root whose marker class styling keys off.
pub trait PresentationRoot {
    fn apply(&self, theme: ThemePreference) -> Result<(), ThemeError>;
}

/// OS or browser color-scheme preference.
pub trait ColorSchemeSource {
    /// `None` when the platform cannot answer.
    fn prefers_dark(&self) -> Option<bool>;
}

/// Inbound notifications feeding `ThemeController::handle_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeEvent {
    /// Another tab wrote to the shared store. `key` is `None` when the whole
    /// store was cleared, `new_value` is `None` when the entry was removed.
    StorageChanged {
        key: Option<String>,
        new_value: Option<String>,
    },
    /// The OS color-scheme preference flipped.
    ColorSchemeChanged { prefers_dark: bool },
}

impl ThemeEvent {
    pub fn storage(key: &str, new_value: &str) -> Self {
        ThemeEvent::StorageChanged {
            key: Some(key.to_string()),
            new_value: Some(new_value.to_string()),
        }
    }
}

/// The collaborators available in the current context. Any of them may be
/// missing, e.g. when rendering outside a browsing context.
#[derive(Clone, Default)]
pub struct ThemeEnvironment {
    pub store: Option<Rc<dyn PreferenceStore>>,
    pub root: Option<Rc<dyn PresentationRoot>>,
    pub color_scheme: Option<Rc<dyn ColorSchemeSource>>,
}

impl ThemeEnvironment {
    /// No store, no document, no media query. Every operation becomes a no-op
    /// apart from the in-memory state.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Rc<dyn PreferenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_root(mut self, root: Rc<dyn PresentationRoot>) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_color_scheme(mut self, color_scheme: Rc<dyn ColorSchemeSource>) -> Self {
        self.color_scheme = Some(color_scheme);
        self
    }

    pub fn is_detached(&self) -> bool {
        self.store.is_none() && self.root.is_none() && self.color_scheme.is_none()
    }
}
