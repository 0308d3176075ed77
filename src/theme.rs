use leptos::prelude::*;
use leptos::reactive::owner::LocalStorage;
use tracing::warn;

use crate::config::ThemeConfig;
use crate::controller::ThemeController;
use crate::env::ThemeEnvironment;
use crate::error::ThemeError;
use crate::preference::ThemePreference;

/// Theme state shared with every component below `ThemeProvider`.
#[derive(Clone, Copy)]
pub struct ThemeContext {
    pub theme: ReadSignal<ThemePreference>,
    controller: StoredValue<ThemeController, LocalStorage>,
}

impl ThemeContext {
    pub fn get(&self) -> ThemePreference {
        self.theme.get()
    }

    pub fn set(&self, theme: ThemePreference) -> Result<(), ThemeError> {
        self.with_controller(|c| c.set_theme(theme))
    }

    pub fn set_named(&self, value: &str) -> Result<ThemePreference, ThemeError> {
        self.with_controller(|c| c.set_theme_named(value))
    }

    pub fn toggle(&self) -> Result<ThemePreference, ThemeError> {
        self.with_controller(|c| c.toggle_theme())
    }

    fn with_controller<T>(
        &self,
        f: impl FnOnce(&ThemeController) -> Result<T, ThemeError>,
    ) -> Result<T, ThemeError> {
        self.controller
            .try_with_value(f)
            .unwrap_or_else(|| Err(ThemeError::Environment("theme provider was disposed".to_string())))
    }
}

/// Owns the tab's `ThemeController` for as long as this part of the tree is
/// mounted, and keeps `ThemeContext::theme` in step with it.
#[component]
pub fn ThemeProvider(
    /// Defaults to `ThemeConfig::default()`
    #[prop(optional)]
    config: Option<ThemeConfig>,
    children: Children,
) -> impl IntoView {
    let config = config.unwrap_or_default();
    let env = current_environment(&config);
    let controller = ThemeController::new(config, env);

    let (theme, set_theme) = signal(controller.theme());
    let subscription = controller.subscribe(move |t| set_theme.set(t));

    #[cfg(target_arch = "wasm32")]
    let listeners = match crate::browser::BrowserListeners::attach(&controller) {
        Ok(listeners) => Some(listeners),
        Err(e) => {
            warn!("Cross-tab theme sync disabled: {}", e);
            None
        }
    };
    #[cfg(not(target_arch = "wasm32"))]
    let listeners = ();

    // Disposed with the owner, which unsubscribes and detaches the listeners.
    let _guards = StoredValue::new_local((subscription, listeners));

    provide_context(ThemeContext {
        theme,
        controller: StoredValue::new_local(controller),
    });

    children()
}

/// Access the theme context. Panics outside a `ThemeProvider`.
pub fn use_theme() -> ThemeContext {
    use_context::<ThemeContext>().expect("use_theme must be used within ThemeProvider")
}

fn current_environment(config: &ThemeConfig) -> ThemeEnvironment {
    #[cfg(target_arch = "wasm32")]
    {
        crate::browser::environment(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        warn!(
            "{}; {} will not be persisted",
            ThemeError::Environment("not running in a browser".to_string()),
            config.storage_key
        );
        ThemeEnvironment::detached()
    }
}
