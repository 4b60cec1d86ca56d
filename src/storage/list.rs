//! Ordered sequence cache.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Options;
use crate::error::Result;
use crate::refresh::{Gate, Stats};
use crate::source::ListSource;
use crate::workers::Sweeper;

use super::whole::{Builder, Whole};

/// A `Vec<T>` rebuilt wholesale from a [`ListSource`].
pub struct List<T> {
    core: Arc<Whole<Arc<Vec<T>>>>,
    sweeper: Sweeper,
}

impl<T> List<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a list cache with a one hour sweep interval.
    ///
    /// Fails with [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// outside a tokio runtime.
    pub fn new<S: ListSource<T>>(source: S, ttl: Duration) -> Result<Self> {
        Self::with_options(source, Options::new(ttl))
    }

    /// Fails with [`CacheError::InvalidCheckInterval`](crate::CacheError::InvalidCheckInterval)
    /// for a zero check interval and [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// when no runtime is given or current.
    pub fn with_options<S: ListSource<T>>(source: S, opts: Options) -> Result<Self> {
        let source = Arc::new(source);
        let builder: Builder<Arc<Vec<T>>> = Arc::new(move || source.build().map(Arc::new));
        let (core, sweeper) = Whole::start(opts, "list", builder)?;
        Ok(Self { core, sweeper })
    }

    /// Runs the rebuild gate; `force` rebuilds regardless of expiry.
    pub fn build(&self, force: bool) -> Gate {
        self.core.build(force)
    }

    /// Shared snapshot of the current content.
    pub fn get(&self) -> Arc<Vec<T>> {
        self.core.read().clone()
    }

    pub fn length(&self) -> usize {
        self.core.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Unix second at which the current content goes stale. Zero until the
    /// first build.
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

impl<T> List<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Owned copy of the current content.
    pub fn copy(&self) -> Vec<T> {
        self.core.read().as_ref().clone()
    }
}
