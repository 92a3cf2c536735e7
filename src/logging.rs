//! Logging utilities for pipeweave

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber filtered by `RUST_LOG` (falling back to `default_level`).
///
/// Returns `false` when a subscriber was already installed, so embedders and
/// tests may call this more than once.
pub fn init_tracing(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .try_init()
        .is_ok()
}
