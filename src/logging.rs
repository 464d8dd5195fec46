//! Tracing setup for hosts that run pipelines.
//!
//! The kernel only emits `tracing` events: a `process` span per process,
//! `debug` for skipped gates and finished runs, `trace` for bound inputs and
//! applied outputs, `warn` when a process fails. Nothing is printed unless
//! the host installs a subscriber, for example with [`init`].

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a compact stderr subscriber filtered by `RUST_LOG`
/// (default `warn`). Panics if a global subscriber is already set.
pub fn init() {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

/// Like [`init`], but reports an already installed subscriber as an error.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
}
