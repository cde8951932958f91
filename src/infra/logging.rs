//! Structured logging setup
//!
//! The subscriber is installed once by the binary. `RUST_LOG` takes precedence
//! over the configured level. Components never touch global logger state; they
//! receive their context as `tracing` spans.

use crate::infra::config::Config;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Build the level filter: RUST_LOG if set, otherwise the configured level
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Returns false if one was already installed.
pub fn init_logging(config: &Config) -> bool {
    let filter = env_filter(config.log_level());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);

    if config.log_json() {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
