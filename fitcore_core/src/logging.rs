//! Tracing setup for the `fitcore` binary.
//!
//! Diagnostics go to stderr so stdout carries only command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the subscriber at WARN unless RUST_LOG says otherwise
pub fn init() {
    init_with_level("warn")
}

/// Install the subscriber with `default_level` as the fallback filter
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route ledger logs through the test harness at DEBUG
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
