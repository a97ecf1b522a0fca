use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`; `LOG_FORMAT=json` selects JSON lines.
/// Logs go to stderr so dry-run output on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(level.trim().to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = registry.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = registry.with(fmt_layer.compact()).try_init();
        }
    }
}
