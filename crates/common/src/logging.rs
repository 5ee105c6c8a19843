//! Logging and tracing initialization.
//!
//! The compiler only emits `tracing` events; installing a subscriber is left
//! to whoever embeds it. These helpers cover the common cases.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the level filter, letting `RUST_LOG` win over the configured level.
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global tracing subscriber described by `config`.
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one is left untouched.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let builder = fmt::Subscriber::builder().with_env_filter(env_filter(config));

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(
            builder
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };
    installed.is_ok()
}

/// Initialize logging with defaults (useful for quick scripts).
pub fn init_default_logging() -> bool {
    init_logging(&LoggingConfig::default())
}

/// Install a subscriber that writes through the test harness capture.
///
/// Diagnostics such as degenerate-transition warnings then show up next to
/// the failing test instead of on the terminal.
pub fn init_test_logging() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        json: false,
    };
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter(&config))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
