//! Clocks used for expiry arithmetic.
//!
//! Every timestamp the engine stores is whole seconds since the Unix epoch.
//! Containers read time through a [`Clock`] so tests can move it by hand.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

/// Source of "now" in Unix seconds.
pub trait Clock: Send + Sync + 'static {
    fn now_unix(&self) -> i64;
}

/// Reads the system wall clock on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        unix_now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock frozen at `now` (Unix seconds).
    pub fn new(now: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Cached time to avoid a syscall per read.
///
/// A background task refreshes the stored value at the given resolution until
/// the returned token is cancelled. Must be started inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct CachedClock {
    now: Arc<AtomicI64>,
}

impl CachedClock {
    /// Starts the ticker and returns the clock plus the token that stops it.
    pub fn start(resolution: Duration) -> (Self, CancellationToken) {
        let now = Arc::new(AtomicI64::new(unix_now()));
        let token = CancellationToken::new();

        let cached = now.clone();
        let token_clone = token.clone();
        tokio::task::spawn(async move {
            let mut interval = tokio::time::interval(resolution);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        cached.store(unix_now(), Ordering::Relaxed);
                    }
                    _ = token_clone.cancelled() => {
                        break;
                    }
                }
            }
        });

        (Self { now }, token)
    }
}

impl Clock for CachedClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// Current wall clock time as Unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs() as i64
}
