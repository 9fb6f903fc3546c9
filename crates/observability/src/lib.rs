//! Shared tracing setup for the gateway binary and tests.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber: JSON lines, filtered by `RUST_LOG`
/// with `default_filter` as the fallback directive when the variable is
/// unset.
///
/// Later calls are no-ops, so binaries and tests can both call this.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .try_init();
}
