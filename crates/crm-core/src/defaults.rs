//! Centralized default constants for the dictionary cache.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// SYNC
// =============================================================================

/// Default period of the timed full refresh, in seconds
/// (`DICTIONARY_SYNC_INTERVAL`).
pub const SYNC_INTERVAL_SECS: u64 = 10;

/// Grain of the hook loop that consumes the should-update flag.
pub const HOOK_POLL_INTERVAL_MS: u64 = 100;

/// How far back the cold-start high-water mark reaches.
pub const COLD_START_LOOKBACK_YEARS: u32 = 10;

// =============================================================================
// SUPERVISION
// =============================================================================

/// Cooldown before the pub/sub listener is restarted.
pub const PUBSUB_RESTART_COOLDOWN_SECS: u64 = 5;

/// Cooldown before the hook loop is restarted.
pub const HOOK_RESTART_COOLDOWN_MS: u64 = 1;

// =============================================================================
// PUB/SUB
// =============================================================================

/// Channel on which write paths announce mutations of mirrored categories.
pub const UPDATE_CHANNEL: &str = "update";

/// Capacity of the in-process update channel.
pub const UPDATE_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// QUERY
// =============================================================================

/// Maximum number of candidates admitted by a user search.
pub const SEARCH_RESULT_LIMIT: usize = 50;

// =============================================================================
// METRICS
// =============================================================================

/// Period of the gauge task that publishes dictionary sizes.
pub const GAUGE_INTERVAL_SECS: u64 = 10;

// =============================================================================
// PHOTOS
// =============================================================================

/// Width of the small profile photo rendition.
pub const PHOTO_SMALL_WIDTH: u32 = 50;

/// Width of the medium profile photo rendition.
pub const PHOTO_MEDIUM_WIDTH: u32 = 200;

/// Width of the large profile photo rendition.
pub const PHOTO_LARGE_WIDTH: u32 = 600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_grain_is_shorter_than_sync_interval() {
        assert!(HOOK_POLL_INTERVAL_MS < SYNC_INTERVAL_SECS * 1000);
    }

    #[test]
    fn test_photo_widths_ascending() {
        assert!(PHOTO_SMALL_WIDTH < PHOTO_MEDIUM_WIDTH);
        assert!(PHOTO_MEDIUM_WIDTH < PHOTO_LARGE_WIDTH);
    }
}
