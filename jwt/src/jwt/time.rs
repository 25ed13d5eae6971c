//! Time source abstraction for token timestamps.
//!
//! `iat`, `exp` and `nbf` are NumericDate values: whole seconds since the Unix
//! epoch. Signing and verification read the clock through `TimeSource` so tests
//! can pin time instead of racing the system clock.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the wall clock.
pub trait TimeSource: fmt::Debug + Send + Sync {
    /// Get the current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> i64;
}

/// Real time source using the system clock.
///
/// This is the default used by every `Jwt` instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> i64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
            })
    }
}

/// Time source frozen at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeSource(pub i64);

impl TimeSource for FixedTimeSource {
    fn now_secs(&self) -> i64 {
        self.0
    }
}
