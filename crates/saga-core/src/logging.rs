//! Structured logging with `tracing`.
//!
//! Log context (save id, entry key, segment index) is attached via
//! structured fields on the call sites; this module only installs the
//! subscriber.

/// Install the process-wide tracing subscriber, writing to stderr.
///
/// `level` is the fallback filter when `RUST_LOG` is not set in the
/// environment. Safe to call more than once.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // An already-installed subscriber wins; ignore the second install.
    let _ = subscriber.try_init();
}
