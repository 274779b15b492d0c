//! Default values for optional configuration fields.
//!
//! # Design
//! - Defaults are applied once through serde while deserialising; nothing mutates the
//!   loaded document afterwards.

use std::time::Duration;

/// Configuration path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Per-request timeout for daemon HTTP calls, in seconds.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Delay after each successful add.
pub(crate) const RATE_LIMIT_SLEEP: Duration = Duration::from_millis(500);

pub(crate) const fn request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

pub(crate) const fn rate_limit_sleep() -> Duration {
    RATE_LIMIT_SLEEP
}

pub(crate) const fn enabled() -> bool {
    true
}
