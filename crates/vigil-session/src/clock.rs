//! Wall clock for session timestamps.
//!
//! Persisted timestamps are Unix epoch milliseconds, because they have to
//! mean something to the next process that reads them. But reading
//! `SystemTime` on every call would let the clock jump backwards (NTP,
//! a user changing the time) and can't be controlled in tests.
//!
//! So [`Clock`] reads the wall clock once, then advances with Tokio's
//! monotonic `Instant`. Two consequences:
//! - `now_ms()` never decreases within a process.
//! - Under a paused Tokio runtime (`start_paused = true`), time moves only
//!   when the test advances it, and the idle deadline and the timestamps
//!   stay in lockstep.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Epoch-millisecond clock anchored to a monotonic instant.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin_ms: u64,
    origin: Instant,
}

impl Clock {
    /// Anchors to the current system time.
    pub fn system() -> Self {
        let origin_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::starting_at(origin_ms)
    }

    /// Anchors to a fixed epoch time. For tests and replay.
    pub fn starting_at(origin_ms: u64) -> Self {
        Self {
            origin_ms,
            origin: Instant::now(),
        }
    }

    /// Current time, Unix epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.origin_ms + self.origin.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}
