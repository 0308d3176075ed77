use leptos::prelude::*;

use crate::error::ThemeError;
use crate::preference::ThemePreference;
use crate::theme::use_theme;

#[component]
pub fn SettingsPage() -> impl IntoView {
    let ctx = use_theme();
    let (theme_name, set_theme_name) = signal(ctx.theme.get_untracked().as_str().to_string());
    let (status, set_status) = signal::<Option<String>>(None);

    let save_theme = move |_| {
        let name = theme_name.get();
        match ctx.set_named(name.trim()) {
            Ok(theme) => {
                set_status.set(Some(format!("Theme set to {}", theme.label())));
            }
            Err(e @ ThemeError::Persistence(_)) => {
                set_status.set(Some(format!("Applied for this tab only: {}", e)));
            }
            Err(e) => {
                set_status.set(Some(format!("Failed to save: {}", e)));
            }
        }
    };

    let pick = move |theme: ThemePreference| {
        move |_: leptos::ev::MouseEvent| {
            set_theme_name.set(theme.as_str().to_string());
            if let Err(e) = ctx.set(theme) {
                set_status.set(Some(format!("Applied for this tab only: {}", e)));
            } else {
                set_status.set(None);
            }
        }
    };

    view! {
        <div class="page settings-page">
            <h2>"Settings"</h2>

            <section class="settings-section">
                <h3>"Appearance"</h3>
                <p class="section-description">
                    "Your choice is saved in this browser and applied to every open tab."
                </p>

                <div class="form-group">
                    <span class="form-label">"Theme"</span>
                    <div class="input-row">
                        <button
                            class="btn"
                            class:btn-active=move || ctx.theme.get() == ThemePreference::Light
                            on:click=pick(ThemePreference::Light)
                        >
                            "Light"
                        </button>
                        <button
                            class="btn"
                            class:btn-active=move || ctx.theme.get() == ThemePreference::Dark
                            on:click=pick(ThemePreference::Dark)
                        >
                            "Dark"
                        </button>
                    </div>
                </div>

                <div class="form-group">
                    <label for="theme-name">"Theme by name"</label>
                    <div class="input-row">
                        <input
                            id="theme-name"
                            type="text"
                            placeholder="light or dark"
                            class="input"
                            prop:value=move || theme_name.get()
                            on:input=move |ev| {
                                set_theme_name.set(event_target_value(&ev));
                            }
                        />
                        <button class="btn btn-save" on:click=save_theme>"Save"</button>
                    </div>
                    <Show when=move || status.get().is_some()>
                        <span class="status-text">{move || status.get().unwrap_or_default()}</span>
                    </Show>
                </div>
            </section>
        </div>
    }
}
