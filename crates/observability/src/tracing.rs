//! Tracing/logging initialization.
//!
//! The engine itself only emits `tracing` events; wiring a subscriber is
//! the embedding process's job, and these helpers cover the common case.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Reads the filter from `RUST_LOG`, defaulting to `info`. Safe to call
/// multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    init_with(filter);
}

/// Initialize with an explicit filter directive (e.g. `"billcraft=debug"`).
pub fn init_with_filter(directive: &str) {
    init_with(EnvFilter::new(directive));
}

fn init_with(filter: EnvFilter) {
    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
