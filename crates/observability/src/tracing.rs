//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::ObservabilityOptions;

/// `RUST_LOG` wins over the configured directive; an unparsable directive
/// falls back to `info`.
pub(crate) fn filter(options: &ObservabilityOptions) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(options: &ObservabilityOptions) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(options))
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = if options.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        ::tracing::debug!(filter = %options.filter, json = options.json, "tracing initialized");
    }
    installed
}
