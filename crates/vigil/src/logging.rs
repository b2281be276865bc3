//! Subscriber setup for binaries embedding Vigil.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a fmt subscriber filtered by `RUST_LOG` (default
/// [`DEFAULT_FILTER`]).
///
/// Returns `false` if a global subscriber was already set, so calling it
/// twice (or from tests) is harmless.
pub fn init() -> bool {
    init_with(DEFAULT_FILTER)
}

/// Same as [`init`] with a custom fallback filter.
pub fn init_with(default_filter: &str) -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
