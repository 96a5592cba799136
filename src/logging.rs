//! Structured logging setup.
//!
//! Progress lines for operators go to stdout; `tracing` events go to stderr
//! at the configured level.

use tracing::Level;

/// Parse a configured level name, defaulting to `WARN` for anything unknown.
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
