//! Engine-wide helpers with no GPU dependency
//!
//! Matrix and vector aliases, the frame timer and `env_logger` setup.

pub mod logging;
pub mod math;
pub mod time;
