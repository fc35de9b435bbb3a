/*!
 * Scheduler Clocks
 * Monotonic nanosecond time sources for scheduling accounting
 */

use crate::core::limits::saturating_u64;
use crate::core::types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source in nanoseconds
pub trait Clock: Send + Sync {
    /// Current time; never goes backwards
    fn now_ns(&self) -> Timestamp;
}

/// Wall-clock backed monotonic clock, zero at construction
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ns(&self) -> Timestamp {
        self.origin.elapsed().as_nanos() as Timestamp
    }
}

/// Manually advanced clock for deterministic simulation and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(saturating_u64(by.as_nanos()), Ordering::SeqCst);
    }

    /// Jump to an absolute time; earlier values are ignored
    pub fn set(&self, to: Timestamp) {
        self.now.fetch_max(to, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ns(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
