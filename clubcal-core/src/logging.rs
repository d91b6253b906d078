//! Tracing subscriber setup for applications embedding clubcal.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "clubcal_core=info,clubcal_provider_firebase=info";

/// Install a formatted subscriber filtered by `RUST_LOG`.
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .try_init()
        .is_ok()
}

/// `RUST_LOG` if it parses, otherwise info for the clubcal crates.
fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
