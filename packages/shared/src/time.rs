//! Time-related utilities with clock abstraction for testability.
//!
//! Chat messages carry unix timestamps in whole seconds, so the clock works in
//! seconds rather than milliseconds.

use chrono::{DateTime, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (seconds)
    fn now_unix_secs(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> i64 {
        get_unix_timestamp()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_secs: i64) -> Self {
        Self {
            fixed_time: fixed_time_secs,
        }
    }
}

impl Clock for FixedClock {
    fn now_unix_secs(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (seconds, UTC)
pub fn get_unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert Unix timestamp (seconds) to RFC 3339 format in UTC
///
/// Returns `None` when the timestamp is outside the range chrono can represent.
pub fn timestamp_to_rfc3339(timestamp_secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp_secs, 0).map(|dt| dt.to_rfc3339())
}
