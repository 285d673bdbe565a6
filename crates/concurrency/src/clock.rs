//! Wall clocks the timestamp authority reads

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of wall-clock milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    /// Current time in milliseconds
    fn now_millis(&self) -> u64;
}

/// The system clock
///
/// Returns 0 if the system clock is before the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// A clock that only moves when told to
///
/// Used to reproduce clock stalls and regressions.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Clock frozen at `millis`
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Jump to `millis` (may go backwards)
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Move forward by `millis`
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
