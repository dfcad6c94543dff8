//! Minimal tracing setup for embedding contexts and tests.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes an env-filtered subscriber writing to `stderr`.
///
/// Filters messages based on the `RUST_LOG` environment variable,
/// defaulting to "info" if it is unset or invalid. Errors during
/// initialization (e.g. a global subscriber is already set) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
