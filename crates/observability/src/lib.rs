//! Tracing and logging setup shared by every binary and test harness.

use serde::Deserialize;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObservabilityOptions {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// JSON lines when true, human-readable text otherwise.
    pub json: bool,
}

impl Default for ObservabilityOptions {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: true,
        }
    }
}

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; only the first call installs a
/// subscriber and returns `true`.
pub fn init(options: &ObservabilityOptions) -> bool {
    tracing::init(options)
}

/// Tracing configuration (filters, layers).
pub mod tracing;
