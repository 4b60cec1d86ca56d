//! Shared core of the whole-cache containers: one unit, one expiry, one
//! sweeper for the entire collection.

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use std::sync::{Arc, Weak};

use crate::config::Options;
use crate::error::Result;
use crate::model::Unit;
use crate::refresh::{Gate, Refresher, Stats};
use crate::workers::{Sweep, Sweeper};

pub(crate) type Builder<P> = Arc<dyn Fn() -> Option<P> + Send + Sync>;

pub(crate) struct Whole<P> {
    unit: Arc<Unit<P>>,
    refresher: Refresher,
    builder: Builder<P>,
}

impl<P> Whole<P>
where
    P: Default + Send + Sync + 'static,
{
    /// Validates `opts`, allocates an empty payload and starts the sweeper.
    pub(crate) fn start(opts: Options, kind: &'static str, builder: Builder<P>) -> Result<(Arc<Self>, Sweeper)> {
        let runtime = opts.validate()?;
        let refresher = Refresher::from_options(&opts, runtime);

        let core = Arc::new(Self {
            unit: Arc::new(Unit::default()),
            refresher,
            builder,
        });

        let target: Weak<dyn Sweep> = Arc::downgrade(&core) as Weak<dyn Sweep>;
        let sweeper = Sweeper::start(target, &core.refresher, opts.check_interval);

        tracing::info!(
            name = %opts.name,
            kind,
            ttl = ?opts.ttl,
            check_interval = ?opts.check_interval,
            "cache created"
        );
        Ok((core, sweeper))
    }

    pub(crate) fn build(&self, force: bool) -> Gate {
        let builder = self.builder.clone();
        if force {
            self.refresher.force(&self.unit, move || builder())
        } else {
            self.refresher.gate(&self.unit, move || builder())
        }
    }

    /// Runs the gate, then takes the shared lock.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, P> {
        self.build(false);
        self.unit.read()
    }

    /// Exclusive access for overlay removals. Expiry is not touched.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, P> {
        self.unit.write()
    }

    /// Overlay insertion. Marks the payload as holding content so the
    /// sweeper drops it once expired.
    pub(crate) fn insert<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        let mut payload = self.unit.write();
        let out = f(&mut payload);
        self.unit.mark_filled();
        out
    }

    pub(crate) fn name(&self) -> &str {
        self.refresher.name()
    }

    pub(crate) fn expired_at(&self) -> i64 {
        self.unit.expired_at()
    }

    pub(crate) fn stats(&self) -> Stats {
        self.refresher.stats()
    }
}

impl<P> Sweep for Whole<P>
where
    P: Default + Send + Sync + 'static,
{
    fn sweep(&self, now: i64) -> usize {
        usize::from(self.unit.reset_if_expired(now))
    }
}
