//! Utility functions for the command-line tools.
//!
//! This module provides QA rendering (behind the `visualization` feature)
//! and logging setup.

#[cfg(feature = "visualization")]
pub mod visualization;

/// Initializes the tracing subscriber for logging.
///
/// Log levels come from `RUST_LOG`; without it only errors are printed. It's
/// typically called at the start of the binary.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
