// Package sweeper provides the periodic eviction worker.

use std::sync::atomic::Ordering;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics;
use crate::refresh::Refresher;
use crate::workers::Sweep;

/// Ticker that evicts expired content from one container.
///
/// The task only holds a weak reference to the container, and it stops when
/// the sweeper is dropped, so it never outlives what it sweeps.
pub struct Sweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns the ticker on the refresher's runtime. The first tick fires one
    /// full interval after start.
    pub fn start(target: Weak<dyn Sweep>, refresher: &Refresher, every: Duration) -> Self {
        let token = CancellationToken::new();
        let handle = refresher
            .runtime()
            .spawn(run(token.clone(), target, refresher.clone(), every));

        Self { token, handle }
    }

    /// Stops ticking. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(token: CancellationToken, target: Weak<dyn Sweep>, refresher: Refresher, every: Duration) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!(svc = "sweeper", name = %refresher.name(), "stopped");
                return;
            }
            _ = ticker.tick() => {
                let Some(alive) = target.upgrade() else {
                    return;
                };
                let now = refresher.now();
                // Eviction waits on unit locks that may be held across a slow
                // source call, so keep it off the async workers.
                let evicted = match tokio::task::spawn_blocking(move || alive.sweep(now)).await {
                    Ok(evicted) => evicted,
                    Err(err) => {
                        tracing::error!(svc = "sweeper", name = %refresher.name(), error = %err, "sweep failed");
                        continue;
                    }
                };

                let counters = refresher.counters();
                counters.sweeps.fetch_add(1, Ordering::Relaxed);
                counters.evicted.fetch_add(evicted as i64, Ordering::Relaxed);
                metrics::add_sweep(refresher.name(), evicted as u64);

                if evicted > 0 {
                    tracing::debug!(svc = "sweeper", name = %refresher.name(), now, evicted, "evicted expired content");
                }
            }
        }
    }
}
