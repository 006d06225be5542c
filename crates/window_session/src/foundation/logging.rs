//! Logging utilities
//!
//! The crate logs through the `log` facade. Binaries pick the sink; [`init`]
//! installs `env_logger`, configured through `RUST_LOG`.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with `env_logger`
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling it twice is harmless.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Initialize logging for tests, capturing output per test
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
