use leptos::prelude::*;
use leptos_router::components::*;
use leptos_router::path;
use tracing::warn;

use crate::components::sidebar::Sidebar;
use crate::config::ThemeConfig;
use crate::pages::home::HomePage;
use crate::pages::settings::SettingsPage;
use crate::theme::ThemeProvider;

const CONFIG_JSON: &str = include_str!("../theme-sync.json");

/// Embedded theme settings, or the defaults if they do not parse.
pub fn load_config() -> ThemeConfig {
    ThemeConfig::from_json(CONFIG_JSON).unwrap_or_else(|e| {
        warn!("Using default theme config: {}", e);
        ThemeConfig::default()
    })
}

#[component]
pub fn App() -> impl IntoView {
    view! {
        <ThemeProvider config=load_config()>
            <Router>
                <div class="app-layout">
                    <Sidebar />
                    <main class="content">
                        <Routes fallback=|| view! { <p>"Page not found"</p> }>
                            <Route path=path!("/") view=HomePage />
                            <Route path=path!("/settings") view=SettingsPage />
                        </Routes>
                    </main>
                </div>
            </Router>
        </ThemeProvider>
    }
}
