// Common test utilities: scripted sources and polling helpers.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builder stand-in that replays a script of results and counts its calls.
/// Once the script runs out the last result is repeated.
pub struct Scripted<P> {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Option<P>>>,
    last: Mutex<Option<P>>,
    delay: Duration,
}

impl<P: Clone> Scripted<P> {
    pub fn new(script: Vec<Option<P>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    /// Like `new`, but every call sleeps first to simulate an expensive source.
    pub fn with_delay(script: Vec<Option<P>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay,
        })
    }

    /// Always returns `value`.
    pub fn always(value: Option<P>) -> Arc<Self> {
        Self::new(vec![value])
    }

    pub fn next(&self) -> Option<P> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let mut last = self.last.lock();
        if let Some(item) = self.script.lock().pop_front() {
            *last = item;
        }
        last.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Polls `check` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Options for a cache driven by `clock`, with a sweep interval long enough
/// to stay out of the way unless a test asks otherwise.
pub fn manual_options(clock: &crate::time::ManualClock, ttl_secs: u64) -> crate::config::Options {
    crate::config::Options::new(Duration::from_secs(ttl_secs))
        .name("test")
        .clock(clock.clone())
}
