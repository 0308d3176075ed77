//! Browser collaborators: `localStorage`, the `<html>` class list and the
//! `prefers-color-scheme` media query, plus the event listeners that feed a
//! controller.

use std::rc::Rc;

use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{MediaQueryList, MediaQueryListEvent, StorageEvent};

use crate::config::ThemeConfig;
use crate::controller::ThemeController;
use crate::env::{ColorSchemeSource, PreferenceStore, PresentationRoot, ThemeEnvironment, ThemeEvent};
use crate::error::ThemeError;
use crate::preference::ThemePreference;

fn js_error(e: wasm_bindgen::JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl PreferenceStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeError> {
        self.storage
            .get_item(key)
            .map_err(|e| ThemeError::Persistence(js_error(e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| ThemeError::Persistence(js_error(e)))
    }
}

/// Toggles the configured marker class on `document.documentElement`.
pub struct DocumentRoot {
    element: web_sys::Element,
    dark_class: String,
}

impl PresentationRoot for DocumentRoot {
    fn apply(&self, theme: ThemePreference) -> Result<(), ThemeError> {
        self.element
            .class_list()
            .toggle_with_force(&self.dark_class, theme.is_dark())
            .map(|_| ())
            .map_err(|e| ThemeError::Environment(js_error(e)))
    }
}

pub struct MediaColorScheme {
    query: MediaQueryList,
}

impl ColorSchemeSource for MediaColorScheme {
    fn prefers_dark(&self) -> Option<bool> {
        Some(self.query.matches())
    }
}

/// Collect whatever the current window offers. Missing pieces are logged
/// and left out so the controller degrades to in-memory behavior.
pub fn environment(config: &ThemeConfig) -> ThemeEnvironment {
    let Some(window) = web_sys::window() else {
        warn!("{}", ThemeError::Environment("no window".to_string()));
        return ThemeEnvironment::detached();
    };

    let mut env = ThemeEnvironment::detached();

    match window.local_storage() {
        Ok(Some(storage)) => {
            env = env.with_store(Rc::new(BrowserStorage { storage }));
        }
        Ok(None) => warn!("{}", ThemeError::Environment("localStorage unavailable".to_string())),
        Err(e) => warn!("{}", ThemeError::Persistence(js_error(e))),
    }

    match window.document().and_then(|doc| doc.document_element()) {
        Some(element) => {
            env = env.with_root(Rc::new(DocumentRoot {
                element,
                dark_class: config.dark_class.clone(),
            }));
        }
        None => warn!("{}", ThemeError::Environment("no document element".to_string())),
    }

    match window.match_media(&config.color_scheme_query) {
        Ok(Some(query)) => {
            env = env.with_color_scheme(Rc::new(MediaColorScheme { query }));
        }
        _ => debug!("Media query {:?} unsupported", config.color_scheme_query),
    }

    env
}

/// Keeps the `storage` and media-query `change` listeners registered. They
/// are removed when this is dropped.
pub struct BrowserListeners {
    window: web_sys::Window,
    storage: Closure<dyn FnMut(StorageEvent)>,
    media: Option<(MediaQueryList, Closure<dyn FnMut(MediaQueryListEvent)>)>,
}

impl BrowserListeners {
    pub fn attach(controller: &ThemeController) -> Result<Self, ThemeError> {
        let window =
            web_sys::window().ok_or_else(|| ThemeError::Environment("no window".to_string()))?;

        let handle = controller.clone();
        let storage = Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
            let outcome = handle.handle_event(ThemeEvent::StorageChanged {
                key: event.key(),
                new_value: event.new_value(),
            });
            debug!("storage event: {:?}", outcome);
        });
        window
            .add_event_listener_with_callback("storage", storage.as_ref().unchecked_ref())
            .map_err(|e| ThemeError::Environment(js_error(e)))?;

        let media = match window.match_media(&controller.config().color_scheme_query) {
            Ok(Some(query)) => {
                let handle = controller.clone();
                let closure =
                    Closure::<dyn FnMut(MediaQueryListEvent)>::new(move |event: MediaQueryListEvent| {
                        let outcome = handle.handle_event(ThemeEvent::ColorSchemeChanged {
                            prefers_dark: event.matches(),
                        });
                        debug!("color scheme event: {:?}", outcome);
                    });
                match query.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref()) {
                    Ok(()) => Some((query, closure)),
                    Err(e) => {
                        warn!("Failed to watch color scheme: {}", js_error(e));
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(Self {
            window,
            storage,
            media,
        })
    }
}

impl Drop for BrowserListeners {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("storage", self.storage.as_ref().unchecked_ref());
        if let Some((query, closure)) = &self.media {
            let _ = query.remove_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        }
    }
}
