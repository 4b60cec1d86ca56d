//! Key-value cache with a single expiry for the whole mapping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Options;
use crate::error::Result;
use crate::refresh::{Gate, Stats};
use crate::source::MapSource;
use crate::workers::Sweeper;

use super::whole::{Builder, Whole};

/// A `HashMap<K, V>` rebuilt wholesale from a [`MapSource`].
///
/// `set` and `delete` edit the cached mapping in place without consulting the
/// source; the edits last until the next rebuild or sweep replaces it.
pub struct Map<K, V> {
    core: Arc<Whole<HashMap<K, V>>>,
    sweeper: Sweeper,
}

impl<K, V> Map<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a map cache with a one hour sweep interval.
    ///
    /// Fails with [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// outside a tokio runtime.
    pub fn new<S: MapSource<K, V>>(source: S, ttl: Duration) -> Result<Self> {
        Self::with_options(source, Options::new(ttl))
    }

    /// Fails with [`CacheError::InvalidCheckInterval`](crate::CacheError::InvalidCheckInterval)
    /// for a zero check interval and [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// when no runtime is given or current.
    pub fn with_options<S: MapSource<K, V>>(source: S, opts: Options) -> Result<Self> {
        let source = Arc::new(source);
        let builder: Builder<HashMap<K, V>> = Arc::new(move || source.build());
        let (core, sweeper) = Whole::start(opts, "map", builder)?;
        Ok(Self { core, sweeper })
    }

    pub fn build(&self, force: bool) -> Gate {
        self.core.build(force)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.core.read().contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.core.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Overlays `key` on the cached mapping.
    pub fn set(&self, key: K, value: V) {
        self.core.insert(|map| map.insert(key, value));
    }

    /// Removes `key` from the cached mapping. Returns whether it was there.
    pub fn delete(&self, key: &K) -> bool {
        self.core.write().remove(key).is_some()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn expired_at(&self) -> i64 {
        self.core.expired_at()
    }

    pub fn stats(&self) -> Stats {
        self.core.stats()
    }

    /// Stops the background sweeper. Reads keep working.
    pub fn close(&self) {
        self.sweeper.stop();
    }
}

impl<K, V> Map<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn get(&self, key: &K) -> Option<V> {
        self.core.read().get(key).cloned()
    }

    /// The value for `key`, or `V::default()` when it is missing.
    pub fn get_or_default(&self, key: &K) -> V
    where
        V: Default,
    {
        self.get(key).unwrap_or_default()
    }

    /// Owned copy of the whole mapping.
    pub fn copy(&self) -> HashMap<K, V> {
        self.core.read().clone()
    }
}
