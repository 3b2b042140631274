pub mod ai;
pub mod billing;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

#[cfg(test)]
mod test_utils;

pub use commands::{AppState, CommandOutcome};
pub use config::{AppConfig, Environment};
pub use error::{BackendError, CommandError, GenerationError, InitError};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Default: warn for most crates, info for ours. Use RUST_LOG=debug for
/// per-request logs. Calling this twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,fitswap=info")),
        )
        .try_init();
}
