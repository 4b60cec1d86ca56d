#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use crate::storage::Set;
    use crate::support::{manual_options, wait_until, Scripted};
    use crate::time::ManualClock;

    fn set(clock: &ManualClock, ttl: u64, script: Vec<Option<Vec<u32>>>) -> Set<u32> {
        let src = Scripted::new(script);
        Set::with_options(move || src.next(), manual_options(clock, ttl)).unwrap()
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let clock = ManualClock::new(0);
        let set = set(&clock, 60, vec![Some(vec![1, 1, 2, 3, 3])]);

        assert_eq!(set.size(), 3);
        assert!(set.has(&2));
        assert!(!set.has(&4));
    }

    #[tokio::test]
    async fn test_intersect_keeps_caller_order() {
        let clock = ManualClock::new(0);
        let set = set(&clock, 60, vec![Some(vec![1, 2, 3])]);

        assert_eq!(set.intersect(&[3, 9, 1, 3]), vec![3, 1, 3]);
        assert!(set.intersect(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_union_and_difference() {
        let clock = ManualClock::new(0);
        let set = set(&clock, 60, vec![Some(vec![1, 2, 3])]);

        let union = set.union(&[3, 4, 5]);
        assert_eq!(union.len(), 5);
        // Cached members come first, then the caller's new ones in order.
        assert_eq!(sorted(union[..3].to_vec()), vec![1, 2, 3]);
        assert_eq!(&union[3..], &[4, 5]);

        assert_eq!(sorted(set.difference(&[2, 7])), vec![1, 3]);
        assert_eq!(sorted(set.difference(&[])), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_add_and_delete_overlay() {
        let clock = ManualClock::new(0);
        let set = set(&clock, 10, vec![Some(vec![1]), Some(vec![5])]);

        assert!(set.has(&1));
        set.add(2);
        assert!(set.delete(&1));
        assert!(!set.delete(&1));
        assert_eq!(set.copy(), HashSet::from([2]));
        assert_eq!(set.expired_at(), 10);

        clock.advance(10);
        assert_eq!(set.copy(), HashSet::from([5]));
    }

    #[tokio::test]
    async fn test_empty_source_result_is_a_valid_build() {
        let clock = ManualClock::new(0);
        let set = set(&clock, 10, vec![Some(vec![1]), Some(vec![])]);

        assert!(!set.is_empty());
        clock.advance(10);
        assert!(set.is_empty());
        assert_eq!(set.stats().failed_rebuilds, 0);
        assert_eq!(set.stats().rebuilds, 2);
    }

    #[tokio::test]
    async fn test_sweeper_empties_expired_set() {
        let clock = ManualClock::new(0);
        let src = Scripted::new(vec![Some(vec![1, 2]), None]);
        let s = src.clone();
        let opts = manual_options(&clock, 10).check_interval(Duration::from_millis(10));
        let set = Set::with_options(move || s.next(), opts).unwrap();

        assert_eq!(set.size(), 2);
        clock.advance(12);
        assert!(wait_until(Duration::from_secs(2), || set.stats().evicted >= 1).await);
        assert!(!set.has(&1));
        assert_eq!(src.calls(), 2);
    }
}
