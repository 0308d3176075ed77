use leptos::prelude::*;

use crate::theme::use_theme;

#[component]
pub fn HomePage() -> impl IntoView {
    let ctx = use_theme();

    view! {
        <div class="page home-page">
            <h2>"Theme Sync"</h2>
            <p class="page-description">
                "Current theme: " <strong>{move || ctx.theme.get().label()}</strong>
            </p>

            <div class="how-it-works">
                <h3>"How It Works"</h3>
                <div class="steps">
                    <div class="step">
                        <span class="step-number">"1"</span>
                        <div class="step-content">
                            <strong>"Start"</strong>
                            <p>"Your saved theme is used, otherwise your system setting"</p>
                        </div>
                    </div>
                    <div class="step">
                        <span class="step-number">"2"</span>
                        <div class="step-content">
                            <strong>"Toggle"</strong>
                            <p>"Switch themes from the sidebar or the settings page"</p>
                        </div>
                    </div>
                    <div class="step">
                        <span class="step-number">"3"</span>
                        <div class="step-content">
                            <strong>"Sync"</strong>
                            <p>"Open another tab and watch it follow along"</p>
                        </div>
                    </div>
                </div>
            </div>
        </div>
    }
}
