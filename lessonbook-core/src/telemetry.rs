//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; binaries and test harnesses call
//! [`init_tracing`] once to install a subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global subscriber filtered by `RUST_LOG` (default `default_filter`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init().is_ok(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init().is_ok(),
    }
}
