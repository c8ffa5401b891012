//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level so operators can raise
//! verbosity for a single module without touching the config file.

use tracing_subscriber::EnvFilter;

/// Build the env filter, falling back to `default_level` when `RUST_LOG` is unset.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber
pub fn init_tracing(default_level: &str, json: bool) {
    let result = if json {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter(default_level))
            .with_current_span(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter(default_level))
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}
