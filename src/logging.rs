/// Install the global logger. Natively this is a tracing subscriber that
/// defaults to `info` unless `RUST_LOG` says otherwise. In the browser,
/// tracing events are forwarded as `log` records to the devtools console and
/// panics are reported there too. Calling this twice is harmless.
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        // No tracing subscriber here: tracing's `log` feature hands every
        // event to the `log` facade instead.
        let _ = console_log::init_with_level(log::Level::Info);
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::info!("logging initialised");
    }
}
