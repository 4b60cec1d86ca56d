//! Cache unit: one payload plus its expiry bookkeeping.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// The thing the refresh engine keeps fresh.
///
/// `expired_at` is read without the lock to take a snapshot, but it is only
/// ever written while the payload write lock is held. Zero means the unit has
/// never been built. `filled` is false while the payload is the empty value
/// the unit started with or was reset to.
pub struct Unit<P> {
    expired_at: AtomicI64,
    refresh_queued: AtomicBool,
    filled: AtomicBool,
    payload: RwLock<P>,
}

impl<P> Unit<P> {
    /// Creates a unit that has never been built, holding `payload`.
    pub fn new(payload: P) -> Self {
        Self::with_filled(payload, true)
    }

    fn with_filled(payload: P, filled: bool) -> Self {
        Self {
            expired_at: AtomicI64::new(0),
            refresh_queued: AtomicBool::new(false),
            filled: AtomicBool::new(filled),
            payload: RwLock::new(payload),
        }
    }

    /// Unix second after which the payload is stale.
    pub fn expired_at(&self) -> i64 {
        self.expired_at.load(Ordering::Acquire)
    }

    /// Must be called with the write guard held.
    pub(crate) fn set_expired_at(&self, at: i64) {
        self.expired_at.store(at, Ordering::Release);
    }

    /// True once `now` has reached the expiry timestamp.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expired_at() <= now
    }

    pub fn read(&self) -> RwLockReadGuard<'_, P> {
        self.payload.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, P> {
        self.payload.write()
    }

    /// True while someone holds the write lock, e.g. during a rebuild.
    pub fn is_building(&self) -> bool {
        self.payload.is_locked_exclusive()
    }

    /// Tries to mark the unit as having a background rebuild queued.
    pub fn try_mark_refresh_queued(&self) -> bool {
        self.refresh_queued
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Clears the refresh queued flag.
    pub fn clear_refresh_queued(&self) {
        self.refresh_queued.store(false, Ordering::Release);
    }

    pub fn is_refresh_queued(&self) -> bool {
        self.refresh_queued.load(Ordering::Acquire)
    }

    /// Records that the payload holds content. Must be called with the write
    /// guard held.
    pub(crate) fn mark_filled(&self) {
        self.filled.store(true, Ordering::Release);
    }

    pub fn is_filled(&self) -> bool {
        self.filled.load(Ordering::Acquire)
    }
}

impl<P: Default> Unit<P> {
    /// Drops the payload if the unit is still expired at `now` once the write
    /// lock is held. Expiry is left untouched so the next read rebuilds.
    /// Returns false when there was nothing to drop.
    pub fn reset_if_expired(&self, now: i64) -> bool {
        if !self.is_expired(now) || !self.is_filled() {
            return false;
        }
        let mut payload = self.write();
        if !self.is_expired(now) || !self.is_filled() {
            return false;
        }
        *payload = P::default();
        self.filled.store(false, Ordering::Release);
        true
    }
}

/// An empty unit. Resetting it is a no-op until something fills it.
impl<P: Default> Default for Unit<P> {
    fn default() -> Self {
        Self::with_filled(P::default(), false)
    }
}
