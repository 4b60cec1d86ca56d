//! Membership cache with set algebra against caller-supplied slices.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Options;
use crate::error::Result;
use crate::refresh::{Gate, Stats};
use crate::source::SetSource;
use crate::workers::Sweeper;

use super::whole::{Builder, Whole};

/// A `HashSet<T>` rebuilt wholesale from a [`SetSource`].
pub struct Set<T> {
    core: Arc<Whole<HashSet<T>>>,
    sweeper: Sweeper,
}

impl<T> Set<T>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    /// Creates a set cache with a one hour sweep interval.
    ///
    /// Fails with [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// outside a tokio runtime.
    pub fn new<S: SetSource<T>>(source: S, ttl: Duration) -> Result<Self> {
        Self::with_options(source, Options::new(ttl))
    }

    /// Fails with [`CacheError::InvalidCheckInterval`](crate::CacheError::InvalidCheckInterval)
    /// for a zero check interval and [`CacheError::NoRuntime`](crate::CacheError::NoRuntime)
    /// when no runtime is given or current.
    pub fn with_options<S: SetSource<T>>(source: S, opts: Options) -> Result<Self> {
        let source = Arc::new(source);
        let builder: Builder<HashSet<T>> =
            Arc::new(move || source.build().map(|members| members.into_iter().collect::<HashSet<T>>()));
        let (core, sweeper) = Whole::start(opts, "set", builder)?;
        Ok(Self { core, sweeper })
    }

    pub fn build(&self, force: bool) -> Gate {
        self.core.build(force)
    }

    pub fn has(&self, member: &T) -> bool {
        self.core.read().contains(member)
    }

    pub fn size(&self) -> usize {
        self.core.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Overlays `member` on the cached set.
    pub fn add(&self, member: T) {
        self.core.insert(|set| set.insert(member));
    }

    /// Removes `member` from the cached set. Returns whether it was there.
    pub fn delete(&self, member: &T) -> bool {
        self.core.write().remove(member)
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

impl<T> Set<T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Elements of `other` that are cached, in `other`'s order. Duplicates in
    /// `other` are kept.
    pub fn intersect(&self, other: &[T]) -> Vec<T> {
        let members = self.core.read();
        other.iter().filter(|v| members.contains(*v)).cloned().collect()
    }

    /// Every cached element followed by the elements of `other` that are not
    /// cached.
    pub fn union(&self, other: &[T]) -> Vec<T> {
        let members = self.core.read();
        let mut result = Vec::with_capacity(members.len() + other.len());
        result.extend(members.iter().cloned());
        result.extend(other.iter().filter(|v| !members.contains(*v)).cloned());
        result
    }

    /// Cached elements that do not appear in `other`.
    pub fn difference(&self, other: &[T]) -> Vec<T> {
        let exclude: HashSet<&T> = other.iter().collect();
        let members = self.core.read();
        members.iter().filter(|v| !exclude.contains(v)).cloned().collect()
    }

    /// Owned copy of the cached set.
    pub fn copy(&self) -> HashSet<T> {
        self.core.read().clone()
    }
}
