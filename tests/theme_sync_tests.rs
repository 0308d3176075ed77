use std::cell::RefCell;
use std::rc::Rc;

use theme_sync::memory::{MemoryColorScheme, MemoryOrigin, MemoryRoot, MemoryTab};
use theme_sync::{
    IgnoreReason, InitialSource, PreferenceStore, Reconciliation, ThemeConfig, ThemeController,
    ThemeEnvironment, ThemeError, ThemeEvent, ThemePreference,
};

const KEY: &str = theme_sync::config::DEFAULT_STORAGE_KEY;

/// One simulated browser tab.
struct Tab {
    store: Rc<MemoryTab>,
    root: Rc<MemoryRoot>,
    color_scheme: Rc<MemoryColorScheme>,
    controller: ThemeController,
    notifications: Rc<RefCell<Vec<ThemePreference>>>,
}

impl Tab {
    fn open(origin: &MemoryOrigin, prefers_dark: Option<bool>) -> Self {
        let store = Rc::new(origin.open_tab());
        let root = Rc::new(MemoryRoot::new());
        let color_scheme = Rc::new(MemoryColorScheme::new(prefers_dark));
        let env = ThemeEnvironment::detached()
            .with_store(store.clone())
            .with_root(root.clone())
            .with_color_scheme(color_scheme.clone());
        let controller = ThemeController::new(ThemeConfig::default(), env);

        let notifications = Rc::new(RefCell::new(Vec::new()));
        let log = notifications.clone();
        controller
            .subscribe(move |theme| log.borrow_mut().push(theme))
            .detach();

        Self {
            store,
            root,
            color_scheme,
            controller,
            notifications,
        }
    }

    fn pump(&self) -> Vec<Reconciliation> {
        self.store.pump(&self.controller)
    }

    fn notification_count(&self) -> usize {
        self.notifications.borrow().len()
    }

    fn assert_reflects(&self, theme: ThemePreference) {
        assert_eq!(self.controller.theme(), theme);
        assert_eq!(
            self.root.has_marker(),
            theme.is_dark(),
            "marker out of sync with {}",
            theme
        );
    }
}

#[test]
fn test_set_twice_is_idempotent() {
    let origin = MemoryOrigin::new();
    let tab = Tab::open(&origin, None);

    tab.controller.set_theme(ThemePreference::Dark).unwrap();
    let after_first = (tab.controller.theme(), origin.get_raw(KEY), tab.root.has_marker());

    tab.controller.set_theme(ThemePreference::Dark).unwrap();
    let after_second = (tab.controller.theme(), origin.get_raw(KEY), tab.root.has_marker());

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.1.as_deref(), Some("dark"));
    tab.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_fresh_controller_reads_persisted_theme() {
    let origin = MemoryOrigin::new();
    let first = Tab::open(&origin, None);
    first.controller.set_theme(ThemePreference::Dark).unwrap();

    let second = Tab::open(&origin, Some(false));
    assert_eq!(second.controller.initial_source(), InitialSource::Persisted);
    second.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_own_write_is_not_processed_as_remote() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);

    a.controller.set_theme(ThemePreference::Dark).unwrap();
    assert_eq!(a.store.pending_events(), 0);
    assert!(a.pump().is_empty());
    assert_eq!(a.notification_count(), 1);
    assert_eq!(origin.write_count(), 1);
}

#[test]
fn test_echoed_write_is_ignored_without_rewrite() {
    let origin = MemoryOrigin::new();
    origin.set_echo_to_writer(true);
    let a = Tab::open(&origin, None);

    a.controller.set_theme(ThemePreference::Dark).unwrap();
    assert_eq!(a.pump(), vec![Reconciliation::Ignored(IgnoreReason::Echo)]);

    assert_eq!(a.notification_count(), 1);
    assert_eq!(origin.write_count(), 1);
    a.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_other_tab_converges() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);
    let b = Tab::open(&origin, None);

    a.controller.set_theme(ThemePreference::Dark).unwrap();
    assert_eq!(b.controller.theme(), ThemePreference::Light);

    assert_eq!(b.pump(), vec![Reconciliation::Adopted(ThemePreference::Dark)]);
    b.assert_reflects(ThemePreference::Dark);
    assert_eq!(*b.notifications.borrow(), vec![ThemePreference::Dark]);
    // b adopted without writing anything back
    assert_eq!(origin.write_count(), 1);
    assert_eq!(a.store.pending_events(), 0);
}

#[test]
fn test_last_write_wins_across_tabs() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);
    let b = Tab::open(&origin, None);
    let c = Tab::open(&origin, None);

    a.controller.set_theme(ThemePreference::Dark).unwrap();
    b.controller.set_theme(ThemePreference::Light).unwrap();
    a.controller.set_theme(ThemePreference::Dark).unwrap();

    a.pump();
    b.pump();
    c.pump();

    assert_eq!(origin.get_raw(KEY).as_deref(), Some("dark"));
    a.assert_reflects(ThemePreference::Dark);
    b.assert_reflects(ThemePreference::Dark);
    c.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_initial_priority_order() {
    let origin = MemoryOrigin::new();
    let system_dark = Tab::open(&origin, Some(true));
    assert_eq!(system_dark.controller.initial_source(), InitialSource::System);
    system_dark.assert_reflects(ThemePreference::Dark);

    let nothing = Tab::open(&MemoryOrigin::new(), None);
    assert_eq!(nothing.controller.initial_source(), InitialSource::Default);
    nothing.assert_reflects(ThemePreference::Light);

    origin.seed(KEY, "light");
    let persisted = Tab::open(&origin, Some(true));
    assert_eq!(persisted.controller.initial_source(), InitialSource::Persisted);
    persisted.assert_reflects(ThemePreference::Light);
}

#[test]
fn test_configured_default_applies_last() {
    let config = ThemeConfig {
        default_theme: ThemePreference::Dark,
        ..ThemeConfig::default()
    };
    let controller = ThemeController::new(config, ThemeEnvironment::detached());
    assert_eq!(controller.theme(), ThemePreference::Dark);
    assert_eq!(controller.initial_source(), InitialSource::Default);
}

#[test]
fn test_invalid_name_is_rejected() {
    let origin = MemoryOrigin::new();
    let tab = Tab::open(&origin, None);

    let err = tab.controller.set_theme_named("blue").unwrap_err();
    assert_eq!(
        err,
        ThemeError::Validation {
            value: "blue".to_string()
        }
    );
    tab.assert_reflects(ThemePreference::Light);
    assert_eq!(origin.write_count(), 0);
    assert_eq!(tab.notification_count(), 0);

    assert_eq!(tab.controller.set_theme_named("dark").unwrap(), ThemePreference::Dark);
    tab.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_toggle_then_remote_change_scenario() {
    let origin = MemoryOrigin::new();
    let tab = Tab::open(&origin, Some(true));
    assert_eq!(tab.controller.theme(), ThemePreference::Dark);

    assert_eq!(tab.controller.toggle_theme().unwrap(), ThemePreference::Light);
    tab.assert_reflects(ThemePreference::Light);
    assert_eq!(origin.get_raw(KEY).as_deref(), Some("light"));

    let other_tab = origin.open_tab();
    other_tab.set(KEY, "dark").unwrap();
    let writes = origin.write_count();

    assert_eq!(tab.pump(), vec![Reconciliation::Adopted(ThemePreference::Dark)]);
    tab.assert_reflects(ThemePreference::Dark);
    assert_eq!(origin.write_count(), writes);
}

#[test]
fn test_invalid_remote_value_is_ignored() {
    let origin = MemoryOrigin::new();
    let tab = Tab::open(&origin, None);

    let outcome = tab.controller.handle_event(ThemeEvent::storage(KEY, "blue"));
    assert_eq!(outcome, Reconciliation::Ignored(IgnoreReason::Invalid));
    tab.assert_reflects(ThemePreference::Light);
    assert_eq!(tab.notification_count(), 0);
}

#[test]
fn test_redundant_remote_value_is_ignored() {
    let origin = MemoryOrigin::new();
    let tab = Tab::open(&origin, None);

    let outcome = tab.controller.handle_event(ThemeEvent::storage(KEY, "light"));
    assert_eq!(outcome, Reconciliation::Ignored(IgnoreReason::Redundant));
    assert_eq!(tab.notification_count(), 0);
}

#[test]
fn test_stale_stored_value_falls_back() {
    let origin = MemoryOrigin::new();
    origin.seed(KEY, "{\"mode\":\"night\"}");

    let tab = Tab::open(&origin, Some(true));
    assert_eq!(tab.controller.initial_source(), InitialSource::System);
    tab.assert_reflects(ThemePreference::Dark);
    // left in place until the user picks a theme
    assert_eq!(origin.get_raw(KEY).as_deref(), Some("{\"mode\":\"night\"}"));
}

#[test]
fn test_write_failure_keeps_visible_theme() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);
    let b = Tab::open(&origin, None);
    origin.set_fail_writes(true);

    let err = a.controller.set_theme(ThemePreference::Dark).unwrap_err();
    assert!(matches!(err, ThemeError::Persistence(_)));
    a.assert_reflects(ThemePreference::Dark);
    assert_eq!(a.notification_count(), 1);

    assert_eq!(origin.get_raw(KEY), None);
    assert!(b.pump().is_empty());
    b.assert_reflects(ThemePreference::Light);
}

#[test]
fn test_read_failure_falls_back_to_system() {
    let origin = MemoryOrigin::new();
    origin.seed(KEY, "light");
    origin.set_fail_reads(true);

    let tab = Tab::open(&origin, Some(true));
    assert_eq!(tab.controller.initial_source(), InitialSource::System);
    tab.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_system_change_applies_until_theme_is_persisted() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, Some(false));
    let b = Tab::open(&origin, Some(false));

    a.color_scheme.set(Some(true));
    let outcome = a
        .controller
        .handle_event(ThemeEvent::ColorSchemeChanged { prefers_dark: true });
    assert_eq!(outcome, Reconciliation::Applied(ThemePreference::Dark));
    a.assert_reflects(ThemePreference::Dark);
    assert_eq!(origin.get_raw(KEY).as_deref(), Some("dark"));

    // persisted like a local change, so the other tab follows
    assert_eq!(b.pump(), vec![Reconciliation::Adopted(ThemePreference::Dark)]);

    let outcome = a
        .controller
        .handle_event(ThemeEvent::ColorSchemeChanged { prefers_dark: false });
    assert_eq!(outcome, Reconciliation::Ignored(IgnoreReason::PersistedPreference));
    a.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_system_change_ignores_corrupt_persisted_value() {
    let origin = MemoryOrigin::new();
    origin.seed(KEY, "sepia");
    let tab = Tab::open(&origin, Some(false));

    let outcome = tab
        .controller
        .handle_event(ThemeEvent::ColorSchemeChanged { prefers_dark: true });
    assert_eq!(outcome, Reconciliation::Applied(ThemePreference::Dark));
    assert_eq!(origin.get_raw(KEY).as_deref(), Some("dark"));
}

#[test]
fn test_detached_environment_never_fails() {
    let controller = ThemeController::new(ThemeConfig::default(), ThemeEnvironment::detached());
    assert_eq!(controller.initial_source(), InitialSource::Default);
    assert_eq!(controller.theme(), ThemePreference::Light);

    controller.set_theme(ThemePreference::Dark).unwrap();
    assert_eq!(controller.toggle_theme().unwrap(), ThemePreference::Light);
    assert_eq!(
        controller.handle_event(ThemeEvent::ColorSchemeChanged { prefers_dark: true }),
        Reconciliation::Applied(ThemePreference::Dark)
    );
    assert_eq!(
        controller.handle_event(ThemeEvent::storage(KEY, "light")),
        Reconciliation::Adopted(ThemePreference::Light)
    );
}

#[test]
fn test_rapid_toggles_last_write_wins() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);
    let b = Tab::open(&origin, None);

    for _ in 0..5 {
        a.controller.toggle_theme().unwrap();
    }
    a.assert_reflects(ThemePreference::Dark);
    assert_eq!(origin.get_raw(KEY).as_deref(), Some("dark"));
    assert_eq!(a.notification_count(), 5);

    b.pump();
    b.assert_reflects(ThemePreference::Dark);
}

#[test]
fn test_superseded_event_is_ignored() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);
    let b = Tab::open(&origin, None);

    b.controller.set_theme(ThemePreference::Dark).unwrap();
    // a writes again before b's event reaches it
    a.controller.set_theme(ThemePreference::Light).unwrap();

    assert_eq!(a.pump(), vec![Reconciliation::Ignored(IgnoreReason::Stale)]);
    a.assert_reflects(ThemePreference::Light);
    assert_eq!(b.pump(), vec![Reconciliation::Adopted(ThemePreference::Light)]);
    b.assert_reflects(ThemePreference::Light);
}

#[test]
fn test_closed_tab_stops_receiving_events() {
    let origin = MemoryOrigin::new();
    let a = Tab::open(&origin, None);
    let b = Tab::open(&origin, None);
    drop(b);

    a.controller.set_theme(ThemePreference::Dark).unwrap();
    assert_eq!(origin.get_raw(KEY).as_deref(), Some("dark"));
    assert!(a.pump().is_empty());
}
