// Package refresh provides periodic stats logging.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use super::counters::Counters;

/// Logs and resets the counters of one cache every `each` until cancelled.
pub async fn logger(
    shutdown_token: CancellationToken,
    name: Arc<str>,
    counters: Arc<Counters>,
    each: Duration,
) {
    let mut ticker = interval(each);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                tracing::debug!(svc = "refresher", name = %name, "logger stopped");
                return;
            }
            _ = ticker.tick() => {
                let stats = counters.reset();
                tracing::info!(
                    name = %name,
                    rebuilds = stats.rebuilds,
                    errors = stats.failed_rebuilds,
                    forced = stats.forced_rebuilds,
                    scheduled = stats.scheduled_rebuilds,
                    sweeps = stats.sweeps,
                    evicted = stats.evicted,
                    "cache stats"
                );
            }
        }
    }
}
