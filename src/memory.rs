//! In-memory stand-ins for the browser collaborators.
//!
//! `MemoryOrigin` plays the role of one origin's `localStorage`. Each
//! `MemoryTab` is a handle for one tab: writes through it queue a
//! `ThemeEvent::StorageChanged` in every *other* tab's inbox, the way a
//! browser dispatches `storage` events. Events are delivered only when a tab
//! is pumped, so cross-tab delivery stays asynchronous.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::controller::{Reconciliation, ThemeController};
use crate::env::{ColorSchemeSource, PreferenceStore, PresentationRoot, ThemeEvent};
use crate::error::ThemeError;
use crate::preference::ThemePreference;

type TabId = usize;

#[derive(Default)]
struct OriginState {
    entries: HashMap<String, String>,
    inboxes: HashMap<TabId, VecDeque<ThemeEvent>>,
    next_tab: TabId,
    writes: usize,
    echo_to_writer: bool,
    fail_writes: bool,
    fail_reads: bool,
}

impl OriginState {
    fn broadcast(&mut self, writer: TabId, event: ThemeEvent) {
        let echo = self.echo_to_writer;
        for (tab, inbox) in self.inboxes.iter_mut() {
            if *tab != writer || echo {
                inbox.push_back(event.clone());
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryOrigin {
    state: Rc<RefCell<OriginState>>,
}

impl MemoryOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_tab(&self) -> MemoryTab {
        let mut state = self.state.borrow_mut();
        let id = state.next_tab;
        state.next_tab += 1;
        state.inboxes.insert(id, VecDeque::new());
        MemoryTab {
            id,
            origin: self.clone(),
        }
    }

    /// Deliver storage events to the writing tab as well, like a polyfill
    /// that does not honor the "other tabs only" rule.
    pub fn set_echo_to_writer(&self, echo: bool) {
        self.state.borrow_mut().echo_to_writer = echo;
    }

    /// Make every write fail, e.g. quota exceeded or storage disabled.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// Successful writes through any tab.
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.state.borrow().entries.get(key).cloned()
    }

    /// Put a value in place without notifying anyone, e.g. data left behind
    /// by an earlier app version.
    pub fn seed(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }
}

/// One tab's view of a `MemoryOrigin`.
pub struct MemoryTab {
    id: TabId,
    origin: MemoryOrigin,
}

impl MemoryTab {
    pub fn remove(&self, key: &str) {
        let mut state = self.origin.state.borrow_mut();
        if state.entries.remove(key).is_some() {
            state.broadcast(
                self.id,
                ThemeEvent::StorageChanged {
                    key: Some(key.to_string()),
                    new_value: None,
                },
            );
        }
    }

    pub fn clear(&self) {
        let mut state = self.origin.state.borrow_mut();
        if !state.entries.is_empty() {
            state.entries.clear();
            state.broadcast(
                self.id,
                ThemeEvent::StorageChanged {
                    key: None,
                    new_value: None,
                },
            );
        }
    }

    pub fn pending_events(&self) -> usize {
        self.origin
            .state
            .borrow()
            .inboxes
            .get(&self.id)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    pub fn take_events(&self) -> Vec<ThemeEvent> {
        self.origin
            .state
            .borrow_mut()
            .inboxes
            .get_mut(&self.id)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Feed every queued storage event into `controller`.
    pub fn pump(&self, controller: &ThemeController) -> Vec<Reconciliation> {
        self.take_events()
            .into_iter()
            .map(|event| controller.handle_event(event))
            .collect()
    }
}

impl PreferenceStore for MemoryTab {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeError> {
        let state = self.origin.state.borrow();
        if state.fail_reads {
            return Err(ThemeError::Persistence("storage is disabled".to_string()));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        let mut state = self.origin.state.borrow_mut();
        if state.fail_writes {
            return Err(ThemeError::Persistence("quota exceeded".to_string()));
        }
        state.writes += 1;
        let previous = state.entries.insert(key.to_string(), value.to_string());
        // Browsers skip the storage event when the value did not change.
        if previous.as_deref() != Some(value) {
            state.broadcast(self.id, ThemeEvent::storage(key, value));
        }
        Ok(())
    }
}

impl Drop for MemoryTab {
    fn drop(&mut self) {
        self.origin.state.borrow_mut().inboxes.remove(&self.id);
    }
}

/// Records the marker state instead of touching a document.
#[derive(Default)]
pub struct MemoryRoot {
    dark: Cell<bool>,
    applies: Cell<usize>,
    fail: Cell<bool>,
}

impl MemoryRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_marker(&self) -> bool {
        self.dark.get()
    }

    pub fn apply_count(&self) -> usize {
        self.applies.get()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl PresentationRoot for MemoryRoot {
    fn apply(&self, theme: ThemePreference) -> Result<(), ThemeError> {
        if self.fail.get() {
            return Err(ThemeError::Environment("document root is gone".to_string()));
        }
        self.dark.set(theme.is_dark());
        self.applies.set(self.applies.get() + 1);
        Ok(())
    }
}

pub struct MemoryColorScheme {
    prefers_dark: Cell<Option<bool>>,
}

impl MemoryColorScheme {
    pub fn new(prefers_dark: Option<bool>) -> Self {
        Self {
            prefers_dark: Cell::new(prefers_dark),
        }
    }

    pub fn set(&self, prefers_dark: Option<bool>) {
        self.prefers_dark.set(prefers_dark);
    }
}

impl ColorSchemeSource for MemoryColorScheme {
    fn prefers_dark(&self) -> Option<bool> {
        self.prefers_dark.get()
    }
}
