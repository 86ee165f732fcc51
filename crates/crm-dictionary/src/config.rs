//! Dictionary configuration.

use std::time::Duration;

use tracing::warn;

use crm_core::defaults::SYNC_INTERVAL_SECS;

/// Environment variable holding the timed refresh period in seconds.
pub const SYNC_INTERVAL_ENV: &str = "DICTIONARY_SYNC_INTERVAL";

/// Configuration for the dictionary and its coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryConfig {
    /// Period of the timed full refresh.
    pub sync_interval: Duration,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(SYNC_INTERVAL_SECS),
        }
    }
}

impl DictionaryConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DICTIONARY_SYNC_INTERVAL` | `10` | Timed refresh period in seconds |
    pub fn from_env() -> Self {
        let raw = std::env::var(SYNC_INTERVAL_ENV).ok();
        Self {
            sync_interval: parse_sync_interval(raw.as_deref()),
        }
    }

    /// Set the timed refresh period.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }
}

/// Positive whole seconds; anything else falls back to the default.
fn parse_sync_interval(raw: Option<&str>) -> Duration {
    let default = Duration::from_secs(SYNC_INTERVAL_SECS);
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!(
                subsystem = "dictionary",
                component = "config",
                value = raw,
                default_secs = SYNC_INTERVAL_SECS,
                "Invalid {SYNC_INTERVAL_ENV}, using default"
            );
            default
        }
    }
}
