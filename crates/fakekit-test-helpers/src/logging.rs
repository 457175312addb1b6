//! Tracing subscriber setup for test binaries.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_TEST_FILTER: &str = "fakekit_core=debug,fakekit_services=debug";

/// Install a test-writer fmt subscriber once per test binary.
///
/// Later calls are no-ops, so every test may call this first.
pub fn init_test_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("test logging initialized");
    }
}
