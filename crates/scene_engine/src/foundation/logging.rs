//! Logging utilities
//!
//! The engine logs through the `log` facade; binaries pick the sink.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honors `RUST_LOG` and falls back to `info` when it is unset.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A second call (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).try_init();
}
