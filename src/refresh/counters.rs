// Package refresh provides counters for rebuild and sweep activity.

use std::sync::atomic::{AtomicI64, Ordering};

/// Counters for one cache instance.
pub struct Counters {
    /// Rebuilds where the source returned data.
    pub rebuilds: AtomicI64,
    /// Rebuilds where the source returned nothing.
    pub failed_rebuilds: AtomicI64,
    /// Rebuilds requested with `force`.
    pub forced_rebuilds: AtomicI64,
    /// Background pre-builds handed to the blocking pool.
    pub scheduled_rebuilds: AtomicI64,
    /// Sweeper ticks.
    pub sweeps: AtomicI64,
    /// Payloads reset or keys removed by the sweeper.
    pub evicted: AtomicI64,
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub rebuilds: i64,
    pub failed_rebuilds: i64,
    pub forced_rebuilds: i64,
    pub scheduled_rebuilds: i64,
    pub sweeps: i64,
    pub evicted: i64,
}

impl Stats {
    /// Every builder invocation, successful or not.
    pub fn builds(&self) -> i64 {
        self.rebuilds + self.failed_rebuilds
    }
}

impl Counters {
    /// Creates new counters.
    pub fn new() -> Self {
        Self {
            rebuilds: AtomicI64::new(0),
            failed_rebuilds: AtomicI64::new(0),
            forced_rebuilds: AtomicI64::new(0),
            scheduled_rebuilds: AtomicI64::new(0),
            sweeps: AtomicI64::new(0),
            evicted: AtomicI64::new(0),
        }
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            failed_rebuilds: self.failed_rebuilds.load(Ordering::Relaxed),
            forced_rebuilds: self.forced_rebuilds.load(Ordering::Relaxed),
            scheduled_rebuilds: self.scheduled_rebuilds.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters and returns their previous values.
    pub fn reset(&self) -> Stats {
        Stats {
            rebuilds: self.rebuilds.swap(0, Ordering::Relaxed),
            failed_rebuilds: self.failed_rebuilds.swap(0, Ordering::Relaxed),
            forced_rebuilds: self.forced_rebuilds.swap(0, Ordering::Relaxed),
            scheduled_rebuilds: self.scheduled_rebuilds.swap(0, Ordering::Relaxed),
            sweeps: self.sweeps.swap(0, Ordering::Relaxed),
            evicted: self.evicted.swap(0, Ordering::Relaxed),
        }
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}
