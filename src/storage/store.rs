//! Keyed cache where every key has its own expiry and rebuild lock.
//!
//! The container lock only guards which keys exist. Content is guarded per
//! key, so rebuilds of different keys run in parallel. A key the source knows
//! nothing about still gets a unit (with no value) so repeated misses are
//! retried once per TTL instead of on every read.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::config::Options;
use crate::error::Result;
use crate::model::Unit;
use crate::refresh::{Counters, Gate, Refresher, Stats};
use crate::source::StoreSource;
use crate::workers::{Sweep, Sweeper};

type Slot<V> = Arc<Unit<Option<V>>>;

/// Per-key TTL cache over a [`StoreSource`]. `O` is the type of the extra
/// options callers pass through to the source.
pub struct Store<K, V, O = ()> {
    inner: Arc<Inner<K, V, O>>,
    sweeper: Sweeper,
}

struct Inner<K, V, O> {
    units: RwLock<HashMap<K, Slot<V>>>,
    refresher: Refresher,
    source: Arc<dyn StoreSource<K, V, O>>,
}

impl<K, V, O> Inner<K, V, O>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    O: Send + 'static,
{
    /// Returns the unit for `key`, inserting an unbuilt placeholder if needed.
    fn unit(&self, key: &K) -> Slot<V> {
        if let Some(unit) = self.units.read().get(key) {
            return unit.clone();
        }
        let mut units = self.units.write();
        units
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Unit::new(None)))
            .clone()
    }

    fn build(&self, force: bool, key: &K, opts: O) -> (Slot<V>, Gate) {
        let unit = self.unit(key);

        let source = self.source.clone();
        let key = key.clone();
        let build = move || source.build(&key, &opts).map(Some);

        let gate = if force {
            self.refresher.force(&unit, build)
        } else {
            self.refresher.gate(&unit, build)
        };
        (unit, gate)
    }
}

impl<K, V, O> Sweep for Inner<K, V, O>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    O: 'static,
{
    fn sweep(&self, now: i64) -> usize {
        let expired: Vec<K> = self
            .units
            .read()
            .iter()
            .filter(|(_, unit)| is_stale(unit, now))
            .map(|(key, _)| key.clone())
            .collect();
        if expired.is_empty() {
            return 0;
        }

        let mut units = self.units.write();
        let mut removed = 0;
        for key in expired {
            let still_expired = units
                .get(&key)
                .is_some_and(|unit| is_stale(unit, now) && !unit.is_building());
            if still_expired {
                units.remove(&key);
                removed += 1;
            }
        }
        removed
    }
}

/// Built at least once and past expiry. Placeholders that were never built
/// are left for the reader that created them.
fn is_stale<V>(unit: &Unit<Option<V>>, now: i64) -> bool {
    let exp = unit.expired_at();
    exp != 0 && exp <= now
}

impl<K, V, O> Store<K, V, O>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    /// Creates a keyed cache with a one hour sweep interval.
    ///
    /// Fails with [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// outside a tokio runtime.
    pub fn new<S: StoreSource<K, V, O>>(source: S, ttl: Duration) -> Result<Self> {
        Self::with_options(source, Options::new(ttl))
    }

    /// Fails with [`CacheError::InvalidCheckInterval`](crate::CacheError::InvalidCheckInterval)
    /// for a zero check interval and [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// when no runtime is given or current.
    pub fn with_options<S: StoreSource<K, V, O>>(source: S, opts: Options) -> Result<Self> {
        let runtime = opts.validate()?;
        let refresher = Refresher::from_options(&opts, runtime);

        let inner = Arc::new(Inner {
            units: RwLock::new(HashMap::new()),
            refresher,
            source: Arc::new(source),
        });

        let target: Weak<dyn Sweep> = Arc::downgrade(&inner) as Weak<dyn Sweep>;
        let sweeper = Sweeper::start(target, &inner.refresher, opts.check_interval);

        tracing::info!(
            name = %opts.name,
            kind = "store",
            ttl = ?opts.ttl,
            check_interval = ?opts.check_interval,
            "cache created"
        );
        Ok(Self { inner, sweeper })
    }

    /// Value for `key`, building it with `opts` if the key is new or expired.
    pub fn get_with(&self, key: &K, opts: O) -> Option<V> {
        let (unit, _) = self.inner.build(false, key, opts);
        let value = unit.read().clone();
        value
    }

    /// Runs the rebuild gate for `key`; `force` rebuilds regardless of expiry.
    pub fn build(&self, force: bool, key: &K, opts: O) -> Gate {
        self.inner.build(force, key, opts).1
    }

    /// Overlays a value for `key` without consulting the source or touching
    /// its expiry. A key without a unit gets an unbuilt one, so the next read
    /// still asks the source (and keeps this value if the source has none).
    pub fn set(&self, key: K, value: V) {
        let unit = self.inner.unit(&key);
        *unit.write() = Some(value);
    }

    /// Drops `key` entirely. Returns whether it was present.
    pub fn delete(&self, key: &K) -> bool {
        self.inner.units.write().remove(key).is_some()
    }

    /// Number of keys held, including keys the source had no value for.
    pub fn size(&self) -> usize {
        self.inner.units.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Expiry of `key`, if it has a unit.
    pub fn expired_at(&self, key: &K) -> Option<i64> {
        self.inner.units.read().get(key).map(|unit| unit.expired_at())
    }

    pub fn name(&self) -> &str {
        self.inner.refresher.name()
    }

    pub fn stats(&self) -> Stats {
        self.inner.refresher.stats()
    }

    /// Live counters, shared with the rebuild engine and the sweeper.
    pub fn counters(&self) -> Arc<Counters> {
        self.inner.refresher.counters().clone()
    }

    /// Stops the background sweeper. Reads keep working.
    pub fn close(&self) {
        self.sweeper.stop();
    }
}

impl<K, V, O> Store<K, V, O>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    O: Default + Send + 'static,
{
    /// Value for `key` with default options.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with(key, O::default())
    }
}
