// Package workers exposes the interface the sweeper drives.

/// Something the sweeper can evict from.
pub trait Sweep: Send + Sync + 'static {
    /// Evicts whatever is expired at `now` (Unix seconds) and returns how
    /// many units were reset or removed.
    fn sweep(&self, now: i64) -> usize;
}
