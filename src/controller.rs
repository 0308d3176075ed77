//! Per-tab owner of the active theme.
//!
//! One `ThemeController` is built per application root. It resolves the
//! initial theme, reflects every change onto the document root, persists
//! local changes to the shared store and reconciles changes other tabs made
//! to that store. All calls happen on the UI thread, so the state lives in a
//! `RefCell` behind an `Rc` and the controller is a cheap cloneable handle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::config::ThemeConfig;
use crate::env::{PreferenceStore, ThemeEnvironment, ThemeEvent};
use crate::error::ThemeError;
use crate::preference::ThemePreference;

pub type SubscriberId = u64;

type Subscriber = Rc<dyn Fn(ThemePreference)>;

/// Where the initial theme came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialSource {
    Persisted,
    System,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event concerned another key, or the whole store was cleared.
    OtherKey,
    /// The entry was removed.
    Removed,
    /// The new value is not a valid theme.
    Invalid,
    /// Our own write coming back to us.
    Echo,
    /// Already showing that theme.
    Redundant,
    /// A later write to the store overtook this event.
    Stale,
    /// An explicit preference is persisted, so the OS signal does not apply.
    PersistedPreference,
}

/// Outcome of one `handle_event` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// A value written by another tab was taken over. Nothing was written back.
    Adopted(ThemePreference),
    /// The OS preference was applied and persisted like a local change.
    Applied(ThemePreference),
    Ignored(IgnoreReason),
}

struct ControllerState {
    theme: ThemePreference,
    // Value of this tab's last write that has not been through a
    // reconciliation pass yet. Cleared on every pass.
    pending_local: Option<ThemePreference>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_id: SubscriberId,
}

struct Shared {
    config: ThemeConfig,
    env: ThemeEnvironment,
    initial_source: InitialSource,
    state: RefCell<ControllerState>,
}

#[derive(Clone)]
pub struct ThemeController {
    shared: Rc<Shared>,
}

impl ThemeController {
    /// Resolve the initial theme (persisted, then OS preference, then the
    /// configured default) and reflect it onto the document root.
    /// Never writes to the store.
    pub fn new(config: ThemeConfig, env: ThemeEnvironment) -> Self {
        if env.is_detached() {
            debug!("No browsing context, theme changes stay in memory");
        }

        let (theme, initial_source) = resolve_initial(&config, &env);
        info!("Initial theme {} ({:?})", theme, initial_source);

        let controller = Self {
            shared: Rc::new(Shared {
                config,
                env,
                initial_source,
                state: RefCell::new(ControllerState {
                    theme,
                    pending_local: None,
                    subscribers: Vec::new(),
                    next_id: 0,
                }),
            }),
        };
        let _ = controller.reflect(theme);
        controller
    }

    pub fn theme(&self) -> ThemePreference {
        self.shared.state.borrow().theme
    }

    pub fn initial_source(&self) -> InitialSource {
        self.shared.initial_source
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.shared.config
    }

    /// Make `theme` the active theme and persist it for the other tabs.
    ///
    /// The in-memory state and the document root are updated even when the
    /// store write fails; in that case `ThemeError::Persistence` is returned
    /// and only durability is lost. Subscribers are notified exactly once.
    pub fn set_theme(&self, theme: ThemePreference) -> Result<(), ThemeError> {
        {
            let mut state = self.shared.state.borrow_mut();
            state.theme = theme;
            state.pending_local = Some(theme);
        }

        let reflected = self.reflect(theme);
        let persisted = self.persist(theme);
        self.notify(theme);
        reflected.and(persisted)
    }

    /// `set_theme` for untyped input such as a form value.
    pub fn set_theme_named(&self, value: &str) -> Result<ThemePreference, ThemeError> {
        let theme = value
            .parse::<ThemePreference>()
            .inspect_err(|_| warn!("Rejected theme value {:?}", value))?;
        self.set_theme(theme)?;
        Ok(theme)
    }

    /// Switch to the other theme. Returns the new theme.
    pub fn toggle_theme(&self) -> Result<ThemePreference, ThemeError> {
        let next = self.theme().opposite();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Register `callback` to run after every theme change. The callback is
    /// removed when the returned `Subscription` is dropped.
    pub fn subscribe(&self, callback: impl Fn(ThemePreference) + 'static) -> Subscription {
        let mut state = self.shared.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, Rc::new(callback)));

        Subscription {
            id,
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.state.borrow().subscribers.len()
    }

    /// Single entry point for storage-change and color-scheme notifications.
    pub fn handle_event(&self, event: ThemeEvent) -> Reconciliation {
        match event {
            ThemeEvent::StorageChanged { key, new_value } => self.reconcile_storage(key, new_value),
            ThemeEvent::ColorSchemeChanged { prefers_dark } => self.reconcile_color_scheme(prefers_dark),
        }
    }

    fn reconcile_storage(&self, key: Option<String>, new_value: Option<String>) -> Reconciliation {
        if key.as_deref() != Some(self.shared.config.storage_key.as_str()) {
            return Reconciliation::Ignored(IgnoreReason::OtherKey);
        }
        let Some(raw) = new_value else {
            return Reconciliation::Ignored(IgnoreReason::Removed);
        };
        let incoming = match raw.parse::<ThemePreference>() {
            Ok(theme) => theme,
            Err(_) => {
                warn!("Invalid theme value from another tab: {:?}", raw);
                return Reconciliation::Ignored(IgnoreReason::Invalid);
            }
        };

        let previous = {
            let mut state = self.shared.state.borrow_mut();
            let pending = state.pending_local.take();
            if pending == Some(incoming) {
                debug!("Ignoring echo of local theme write: {}", incoming);
                return Reconciliation::Ignored(IgnoreReason::Echo);
            }
            if incoming == state.theme {
                return Reconciliation::Ignored(IgnoreReason::Redundant);
            }
            state.theme
        };

        // Only trust the event while the store still agrees with it.
        if self.is_superseded(incoming) {
            debug!("Ignoring superseded theme event: {}", incoming);
            return Reconciliation::Ignored(IgnoreReason::Stale);
        }
        self.shared.state.borrow_mut().theme = incoming;

        info!("Theme synced from another tab: {} -> {}", previous, incoming);
        let _ = self.reflect(incoming);
        self.notify(incoming);
        Reconciliation::Adopted(incoming)
    }

    fn reconcile_color_scheme(&self, prefers_dark: bool) -> Reconciliation {
        if let Some(store) = &self.shared.env.store {
            if read_persisted(store.as_ref(), &self.shared.config.storage_key).is_some() {
                debug!("Ignoring color-scheme change, an explicit theme is persisted");
                return Reconciliation::Ignored(IgnoreReason::PersistedPreference);
            }
        }

        let theme = ThemePreference::from_prefers_dark(prefers_dark);
        info!("Following system color scheme: {}", theme);
        // Failures were already logged; the visible theme is correct either way.
        let _ = self.set_theme(theme);
        Reconciliation::Applied(theme)
    }

    // An event is superseded when the store already holds a different valid
    // theme, i.e. a later write overtook it. Unreadable or invalid store
    // contents do not count: the event is trusted then.
    fn is_superseded(&self, incoming: ThemePreference) -> bool {
        let Some(store) = &self.shared.env.store else {
            return false;
        };
        match store.get(&self.shared.config.storage_key) {
            Ok(Some(raw)) => raw
                .parse::<ThemePreference>()
                .map(|current| current != incoming)
                .unwrap_or(false),
            _ => false,
        }
    }

    fn reflect(&self, theme: ThemePreference) -> Result<(), ThemeError> {
        let Some(root) = &self.shared.env.root else {
            return Ok(());
        };
        root.apply(theme)
            .inspect_err(|e| warn!("Failed to apply theme {} to document: {}", theme, e))
    }

    fn persist(&self, theme: ThemePreference) -> Result<(), ThemeError> {
        let Some(store) = &self.shared.env.store else {
            return Ok(());
        };
        store
            .set(&self.shared.config.storage_key, theme.as_str())
            .inspect_err(|e| warn!("Failed to persist theme {}: {}", theme, e))
    }

    fn notify(&self, theme: ThemePreference) {
        // Callbacks may call back into the controller, so release the borrow first.
        let subscribers: Vec<Subscriber> = self
            .shared
            .state
            .borrow()
            .subscribers
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        for subscriber in subscribers {
            subscriber(theme);
        }
    }
}

impl Shared {
    fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sid, _)| *sid != id);
        state.subscribers.len() != before
    }
}

/// Guard returned by `ThemeController::subscribe`.
pub struct Subscription {
    id: SubscriberId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Keep the callback registered for the controller's whole lifetime.
    pub fn detach(mut self) -> SubscriberId {
        self.shared = Weak::new();
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.unsubscribe(self.id);
        }
    }
}

/// Read and validate the persisted theme. Invalid or unreadable values count
/// as "nothing persisted".
pub fn read_persisted(store: &dyn PreferenceStore, key: &str) -> Option<ThemePreference> {
    match store.get(key) {
        Ok(Some(raw)) => match raw.parse::<ThemePreference>() {
            Ok(theme) => Some(theme),
            Err(_) => {
                warn!("Ignoring invalid stored theme {:?} under {}", raw, key);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read stored theme: {}", e);
            None
        }
    }
}

fn resolve_initial(config: &ThemeConfig, env: &ThemeEnvironment) -> (ThemePreference, InitialSource) {
    if let Some(theme) = env
        .store
        .as_ref()
        .and_then(|store| read_persisted(store.as_ref(), &config.storage_key))
    {
        return (theme, InitialSource::Persisted);
    }

    if let Some(prefers_dark) = env.color_scheme.as_ref().and_then(|cs| cs.prefers_dark()) {
        return (ThemePreference::from_prefers_dark(prefers_dark), InitialSource::System);
    }

    (config.default_theme, InitialSource::Default)
}
