//! Log output for tests.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `warn`. Output goes through
/// the test harness writer so it is captured per test. Safe to call from
/// every test; only the first call installs anything.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // another subscriber may already be installed by the host binary
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
