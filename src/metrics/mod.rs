//! Metric emission.
//!
//! Counters go through the `metrics` facade and are no-ops until the host
//! application installs a recorder. Every counter is labelled with the cache
//! name.

pub const REBUILDS_TOTAL: &str = "refcache_rebuilds_total";
pub const REBUILD_ERRORS_TOTAL: &str = "refcache_rebuild_errors_total";
pub const FORCED_REBUILDS_TOTAL: &str = "refcache_forced_rebuilds_total";
pub const SCHEDULED_REBUILDS_TOTAL: &str = "refcache_scheduled_rebuilds_total";
pub const SWEEPS_TOTAL: &str = "refcache_sweeps_total";
pub const EVICTED_TOTAL: &str = "refcache_evicted_total";
pub const REBUILD_DURATION_SECONDS: &str = "refcache_rebuild_duration_seconds";

const CACHE_LABEL: &str = "cache";

/// Records one finished rebuild attempt.
pub fn add_rebuild(cache: &str, ok: bool, seconds: f64) {
    if ok {
        metrics::counter!(REBUILDS_TOTAL, CACHE_LABEL => cache.to_string()).increment(1);
    } else {
        metrics::counter!(REBUILD_ERRORS_TOTAL, CACHE_LABEL => cache.to_string()).increment(1);
    }
    metrics::histogram!(REBUILD_DURATION_SECONDS, CACHE_LABEL => cache.to_string()).record(seconds);
}

pub fn add_forced_rebuild(cache: &str) {
    metrics::counter!(FORCED_REBUILDS_TOTAL, CACHE_LABEL => cache.to_string()).increment(1);
}

pub fn add_scheduled_rebuild(cache: &str) {
    metrics::counter!(SCHEDULED_REBUILDS_TOTAL, CACHE_LABEL => cache.to_string()).increment(1);
}

/// Records one sweeper tick and how many units it evicted.
pub fn add_sweep(cache: &str, evicted: u64) {
    metrics::counter!(SWEEPS_TOTAL, CACHE_LABEL => cache.to_string()).increment(1);
    if evicted > 0 {
        metrics::counter!(EVICTED_TOTAL, CACHE_LABEL => cache.to_string()).increment(evicted);
    }
}
