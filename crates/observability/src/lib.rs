//! Process-wide logging setup.

pub mod subscriber;

pub use subscriber::{LogConfig, LogFormat, init_with};

/// Install the subscriber configured from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    init_with(&LogConfig::from_env());
}
