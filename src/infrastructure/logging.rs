//! Logging configuration
//!
//! Initializes tracing for the application. Diagnostics go to stderr so
//! that job output on stdout stays clean.

/// Initializes logging with the specified default level.
///
/// `RUST_LOG`, when set, takes precedence over `level`. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init();
}
