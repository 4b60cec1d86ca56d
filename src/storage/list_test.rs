#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::Options;
    use crate::error::CacheError;
    use crate::refresh::Gate;
    use crate::storage::List;
    use crate::support::{manual_options, wait_until, Scripted};
    use crate::time::ManualClock;

    fn list(clock: &ManualClock, ttl: u64, script: Vec<Option<Vec<i32>>>) -> (List<i32>, std::sync::Arc<Scripted<Vec<i32>>>) {
        let src = Scripted::new(script);
        let s = src.clone();
        let list = List::with_options(move || s.next(), manual_options(clock, ttl)).unwrap();
        (list, src)
    }

    /// ttl=10s, source yields [1,2,3] then [4,5,6]: at t=9 the gate hands the
    /// rebuild to the background and the new content lands with expiry 19.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_prebuild_scenario() {
        let clock = ManualClock::new(0);
        let (list, src) = list(&clock, 10, vec![Some(vec![1, 2, 3]), Some(vec![4, 5, 6])]);

        assert_eq!(*list.get(), vec![1, 2, 3]);
        assert_eq!(list.expired_at(), 10);

        clock.set(9);
        assert_eq!(list.build(false), Gate::Scheduled);
        let during = list.get();
        assert!(*during == vec![1, 2, 3] || *during == vec![4, 5, 6]);

        assert!(wait_until(Duration::from_secs(2), || list.expired_at() == 19).await);
        assert_eq!(*list.get(), vec![4, 5, 6]);
        assert_eq!(src.calls(), 2);
        assert_eq!(list.stats().scheduled_rebuilds, 1);
    }

    #[tokio::test]
    async fn test_get_snapshot_survives_rebuild() {
        let clock = ManualClock::new(0);
        let (list, _) = list(&clock, 10, vec![Some(vec![1]), Some(vec![2])]);

        let before = list.get();
        clock.advance(10);
        let after = list.get();

        assert_eq!(*before, vec![1]);
        assert_eq!(*after, vec![2]);
    }

    #[tokio::test]
    async fn test_copy_is_detached() {
        let clock = ManualClock::new(0);
        let (list, src) = list(&clock, 60, vec![Some(vec![1, 2])]);

        let mut copy = list.copy();
        copy.push(3);

        assert_eq!(list.length(), 2);
        assert_eq!(*list.get(), vec![1, 2]);
        assert_eq!(src.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_build_keeps_stale_list() {
        let clock = ManualClock::new(100);
        let (list, src) = list(&clock, 10, vec![Some(vec![5, 6]), None]);

        assert_eq!(list.length(), 2);
        clock.advance(10);
        assert_eq!(*list.get(), vec![5, 6]);
        assert_eq!(list.expired_at(), 120);

        // The failure pushed expiry out, so the source is left alone.
        clock.advance(5);
        list.get();
        assert_eq!(src.calls(), 2);
    }

    #[tokio::test]
    async fn test_force_build_bypasses_ttl() {
        let clock = ManualClock::new(0);
        let (list, src) = list(&clock, 3600, vec![Some(vec![1]), Some(vec![2])]);

        list.get();
        clock.advance(1);
        assert_eq!(list.build(true), Gate::Rebuilt);
        assert_eq!(*list.get(), vec![2]);
        assert_eq!(list.expired_at(), 3601);
        assert_eq!(src.calls(), 2);
    }

    #[tokio::test]
    async fn test_build_without_force_respects_ttl() {
        let clock = ManualClock::new(0);
        let (list, src) = list(&clock, 3600, vec![Some(vec![1])]);

        assert_eq!(list.build(false), Gate::Rebuilt);
        assert_eq!(list.build(false), Gate::Fresh);
        assert_eq!(src.calls(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_resets_unread_expired_list() {
        let clock = ManualClock::new(0);
        let src = Scripted::new(vec![Some(vec![1, 2, 3]), None]);
        let s = src.clone();
        let opts = manual_options(&clock, 10).check_interval(Duration::from_millis(10));
        let list = List::with_options(move || s.next(), opts).unwrap();

        assert_eq!(list.length(), 3);
        clock.advance(10);
        assert!(wait_until(Duration::from_secs(2), || list.stats().sweeps >= 5).await);
        // Later ticks find nothing left to drop.
        assert_eq!(list.stats().evicted, 1);

        // Nothing left to serve and the source has nothing either.
        assert!(list.get().is_empty());
        assert_eq!(src.calls(), 2);
    }

    #[tokio::test]
    async fn test_sweeper_ignores_never_built_list() {
        let clock = ManualClock::new(1_000);
        let src = Scripted::new(vec![Some(vec![1])]);
        let s = src.clone();
        let opts = manual_options(&clock, 10).check_interval(Duration::from_millis(10));
        let list = List::with_options(move || s.next(), opts).unwrap();

        assert!(wait_until(Duration::from_secs(2), || list.stats().sweeps >= 5).await);
        assert_eq!(list.stats().evicted, 0);
        assert_eq!(src.calls(), 0);
    }

    #[tokio::test]
    async fn test_sweeper_leaves_live_list_alone() {
        let clock = ManualClock::new(0);
        let src = Scripted::new(vec![Some(vec![1])]);
        let s = src.clone();
        let opts = manual_options(&clock, 10).check_interval(Duration::from_millis(10));
        let list = List::with_options(move || s.next(), opts).unwrap();

        list.get();
        clock.advance(5);
        assert!(wait_until(Duration::from_secs(2), || list.stats().sweeps >= 3).await);
        assert_eq!(list.stats().evicted, 0);
        assert_eq!(*list.get(), vec![1]);
        assert_eq!(src.calls(), 1);
    }

    #[tokio::test]
    async fn test_close_stops_sweeping() {
        let clock = ManualClock::new(0);
        let opts = manual_options(&clock, 10).check_interval(Duration::from_millis(10));
        let list = List::with_options(|| Some(vec![1]), opts).unwrap();

        assert!(wait_until(Duration::from_secs(2), || list.stats().sweeps >= 1).await);
        list.close();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let sweeps = list.stats().sweeps;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(list.stats().sweeps, sweeps);
    }

    #[tokio::test]
    async fn test_zero_check_interval_is_rejected() {
        let opts = Options::new(Duration::from_secs(10)).check_interval(Duration::ZERO);
        let err = List::with_options(|| Some(vec![1u8]), opts).err().unwrap();
        assert!(matches!(err, CacheError::InvalidCheckInterval(_)));
    }

    #[test]
    fn test_construction_needs_a_runtime() {
        let err = List::new(|| Some(vec![1u8]), Duration::from_secs(10)).err().unwrap();
        assert!(matches!(err, CacheError::NoRuntime));
    }

    #[test]
    fn test_explicit_runtime_handle() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let opts = Options::new(Duration::from_secs(10)).runtime(rt.handle().clone());
        let list = List::with_options(|| Some(vec!["a".to_string()]), opts).unwrap();

        assert_eq!(list.copy(), vec!["a".to_string()]);
        assert_eq!(list.name(), "cache");
    }
}
