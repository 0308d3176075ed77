use leptos::prelude::*;

use crate::components::theme_toggle::ThemeToggle;

#[component]
pub fn Sidebar() -> impl IntoView {
    view! {
        <nav class="sidebar">
            <div class="sidebar-header">
                <h1 class="sidebar-title">"Theme Sync"</h1>
                <p class="sidebar-subtitle">"Light/dark across tabs"</p>
            </div>
            <ul class="nav-list">
                <li class="nav-item">
                    <a href="/" class="nav-link">"Home"</a>
                </li>
                <li class="nav-item">
                    <a href="/settings" class="nav-link">"Settings"</a>
                </li>
            </ul>
            <div class="sidebar-footer">
                <ThemeToggle />
            </div>
        </nav>
    }
}
