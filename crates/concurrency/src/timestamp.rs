//! Per-collection version arbitration
//!
//! A version is a millisecond timestamp that is forced to move forward:
//!
//! ```text
//! bump(last) = now          if now > last
//!            = last + 1     otherwise (clock stalled or went backwards)
//! ```
//!
//! The authority holds no per-collection state. The last version of each
//! collection (its high-water mark) is owned by the backend and read and
//! written inside the backend's atomic write, which is what makes two
//! concurrent bumps on one collection impossible to collide. Durability of
//! the high-water mark across restarts is likewise the backend's.
//!
//! ## Baselines
//!
//! A collection that was never written reports the current time as its
//! timestamp, so a sync client can use it as "nothing changed since now".
//! The authority remembers the highest baseline it handed out and the first
//! bump of an unwritten collection lands strictly above it; otherwise a
//! write in the same millisecond would be invisible to a `> baseline` pull.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};

/// Produces strictly increasing versions
pub struct TimestampAuthority {
    clock: Arc<dyn Clock>,
    /// Highest baseline returned for an unwritten collection
    baseline_floor: AtomicU64,
}

impl TimestampAuthority {
    /// Authority reading `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            baseline_floor: AtomicU64::new(0),
        }
    }

    /// Authority reading the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Collection timestamp: its high-water mark, or a baseline if unwritten
    pub fn current(&self, high_water: Option<u64>) -> u64 {
        match high_water {
            Some(version) => version,
            None => {
                let now = self.clock.now_millis();
                self.baseline_floor.fetch_max(now, Ordering::SeqCst);
                now
            }
        }
    }

    /// Next version after `last` (the collection's high-water mark)
    ///
    /// Must be called inside the backend write that persists the result.
    pub fn bump(&self, last: Option<u64>) -> u64 {
        let candidate = self.clock.now_millis();
        let floor = match last {
            Some(version) => version,
            None => self.baseline_floor.load(Ordering::SeqCst),
        };
        if candidate > floor {
            return candidate;
        }
        if last.is_some() && candidate < floor {
            tracing::warn!(
                clock = candidate,
                high_water = floor,
                "Clock is behind collection high-water mark, using logical increment"
            );
        }
        floor.saturating_add(1)
    }
}

impl Default for TimestampAuthority {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for TimestampAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampAuthority")
            .field("baseline_floor", &self.baseline_floor.load(Ordering::Relaxed))
            .finish()
    }
}
