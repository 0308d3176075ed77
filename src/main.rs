use theme_sync::app::App;

fn main() {
    theme_sync::logging::init();
    leptos::mount::mount_to_body(App);
}
