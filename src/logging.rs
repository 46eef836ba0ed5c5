//! Logging setup.
//!
//! Structured logging via the `tracing` ecosystem. All logs go to
//! **stderr**, keeping stdout free for the embedding runtime.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`,
//!   `zentral_provider=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show info logs (default)
//! RUST_LOG=info ./zentral-provider
//!
//! # Show debug logs for the provider only
//! RUST_LOG=zentral_provider=debug ./zentral-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Initialize the default logging subscriber.
///
/// Respects the `RUST_LOG` environment variable for filtering and defaults
/// to `info` when it is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .init();
}

/// Initialize logging with a custom default level.
///
/// Like [`init_logging`], but `default_level` (e.g. "debug") is used when
/// `RUST_LOG` is not set.
pub fn init_logging_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Unlike [`init_logging`], this does not panic if a subscriber has already
/// been set, so tests can call it repeatedly.
pub fn try_init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so the init
    // paths are exercised through try_init_logging only.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("debug").is_ok());
        assert!(EnvFilter::try_new("zentral_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,zentral_provider=debug").is_ok());
    }
}
