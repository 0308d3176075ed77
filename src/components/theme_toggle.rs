use leptos::prelude::*;
use tracing::warn;

use crate::preference::ThemePreference;
use crate::theme::use_theme;

/// Button switching to the other theme. The label names the mode a click
/// switches to.
#[component]
pub fn ThemeToggle() -> impl IntoView {
    let ctx = use_theme();

    let toggle = move |_| {
        if let Err(e) = ctx.toggle() {
            warn!("Theme toggle: {}", e);
        }
    };

    let is_dark = move || ctx.theme.get() == ThemePreference::Dark;

    view! {
        <button
            class=move || if is_dark() { "btn theme-toggle theme-toggle-dark" } else { "btn theme-toggle" }
            on:click=toggle
            title="Toggle theme"
        >
            {move || if is_dark() { "\u{1F31E} Light Mode" } else { "\u{1F319} Dark Mode" }}
        </button>
    }
}
