//! Rebuild gate shared by every container.
//!
//! A read first calls [`Refresher::gate`] on the unit it is about to read:
//!
//! * hard-expired units are rebuilt synchronously under the unit's write
//!   lock, but only if the expiry snapshot taken before locking still
//!   matches, so of many racing readers exactly one calls the source;
//! * units inside the pre-build window are rebuilt on the blocking pool
//!   while the reader carries on with the current payload;
//! * anything else is left alone.
//!
//! Every rebuild attempt moves `expired_at` to `now + ttl`, including the
//! ones where the source had nothing to give.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;

use crate::config::Options;
use crate::metrics;
use crate::model::Unit;
use crate::time::Clock;

use super::counters::{Counters, Stats};

/// What the gate did for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Payload is well within its TTL.
    Fresh,
    /// This caller ran the source. Also returned when the source gave
    /// nothing and the old payload was kept; `Stats::failed_rebuilds` tells
    /// the two apart.
    Rebuilt,
    /// Another caller rebuilt the unit between snapshot and lock.
    Skipped,
    /// A background rebuild is queued for the unit.
    Scheduled,
}

/// Seconds before expiry at which reads start a background rebuild:
/// a tenth of the TTL, at least one second.
pub fn prebuild_window(ttl: i64) -> i64 {
    (ttl / 10).max(1)
}

/// Refresh policy for one container.
#[derive(Clone)]
pub struct Refresher {
    name: Arc<str>,
    ttl: i64,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    counters: Arc<Counters>,
}

impl Refresher {
    pub fn new(name: impl Into<Arc<str>>, ttl: i64, clock: Arc<dyn Clock>, runtime: Handle) -> Self {
        Self {
            name: name.into(),
            ttl,
            clock,
            runtime,
            counters: Arc::new(Counters::new()),
        }
    }

    pub(crate) fn from_options(opts: &Options, runtime: Handle) -> Self {
        Self::new(opts.name.as_str(), opts.ttl_secs(), opts.clock.clone(), runtime)
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// TTL in seconds.
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    pub fn now(&self) -> i64 {
        self.clock.now_unix()
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    pub fn stats(&self) -> Stats {
        self.counters.snapshot()
    }

    /// Runs the rebuild gate for `unit`. `build` is only called if this caller
    /// wins the rebuild.
    pub fn gate<P, F>(&self, unit: &Arc<Unit<P>>, build: F) -> Gate
    where
        P: Send + Sync + 'static,
        F: FnOnce() -> Option<P> + Send + 'static,
    {
        let now = self.clock.now_unix();
        let exp = unit.expired_at();

        if exp <= now {
            let mut payload = unit.write();
            if exp != unit.expired_at() {
                return Gate::Skipped;
            }
            self.rebuild(unit, &mut *payload, build);
            return Gate::Rebuilt;
        }

        if exp - now <= prebuild_window(self.ttl) {
            self.schedule(unit, exp, build);
            return Gate::Scheduled;
        }

        Gate::Fresh
    }

    /// Rebuilds `unit` unconditionally, blocking until the source returns.
    pub fn force<P, F>(&self, unit: &Arc<Unit<P>>, build: F) -> Gate
    where
        F: FnOnce() -> Option<P>,
    {
        let mut payload = unit.write();
        self.counters.forced_rebuilds.fetch_add(1, Ordering::Relaxed);
        metrics::add_forced_rebuild(&self.name);
        self.rebuild(unit, &mut *payload, build);
        Gate::Rebuilt
    }

    /// Hands the locked double-check to the blocking pool. At most one task
    /// per unit is queued at a time.
    fn schedule<P, F>(&self, unit: &Arc<Unit<P>>, exp: i64, build: F)
    where
        P: Send + Sync + 'static,
        F: FnOnce() -> Option<P> + Send + 'static,
    {
        if !unit.try_mark_refresh_queued() {
            return;
        }
        self.counters.scheduled_rebuilds.fetch_add(1, Ordering::Relaxed);
        metrics::add_scheduled_rebuild(&self.name);

        let queued = QueuedGuard(unit.clone());
        let refresher = self.clone();
        let task = self.runtime.spawn_blocking(move || {
            let unit = &queued.0;
            let mut payload = unit.write();
            if exp == unit.expired_at() {
                refresher.rebuild(unit, &mut *payload, build);
            }
        });

        let name = self.name.clone();
        self.runtime.spawn(async move {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::error!(name = %name, "background rebuild panicked");
                }
            }
        });
    }

    /// Calls the source and advances expiry. The caller holds the write lock.
    fn rebuild<P, F>(&self, unit: &Unit<P>, payload: &mut P, build: F)
    where
        F: FnOnce() -> Option<P>,
    {
        let started = Instant::now();
        let fresh = build();
        let elapsed = started.elapsed();

        let ok = match fresh {
            Some(p) => {
                *payload = p;
                unit.mark_filled();
                true
            }
            None => false,
        };

        let expired_at = self.clock.now_unix() + self.ttl;
        unit.set_expired_at(expired_at);

        metrics::add_rebuild(&self.name, ok, elapsed.as_secs_f64());
        if ok {
            self.counters.rebuilds.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(name = %self.name, expired_at, elapsed = ?elapsed, "rebuilt");
        } else {
            self.counters.failed_rebuilds.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                name = %self.name,
                expired_at,
                elapsed = ?elapsed,
                "source returned nothing, keeping previous payload"
            );
        }
    }
}

/// Clears the unit's queued flag once the background task is done with it,
/// or when the task is dropped without running.
struct QueuedGuard<P>(Arc<Unit<P>>);

impl<P> Drop for QueuedGuard<P> {
    fn drop(&mut self) {
        self.0.clear_refresh_queued();
    }
}
