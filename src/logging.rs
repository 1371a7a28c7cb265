//! Internal diagnostics
//!
//! Relay engines report through `tracing`; this installs the subscriber.
//! Diagnostics go to stderr and never into the record store.

/// Initialize tracing for relay debug output
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output. `RUST_LOG` overrides both.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .try_init();
}
