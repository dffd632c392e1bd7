//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Hosts that install their own `log` implementation should skip this.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring an already-installed logger
///
/// Useful in tests and tools where several entry points may race to install one.
pub fn try_init() -> bool {
    env_logger::try_init().is_ok()
}
