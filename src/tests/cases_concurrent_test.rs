// Scenario tests for readers and writers running side by side.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::refresh::Gate;
use crate::storage::{Map, Set};
use crate::support::{manual_options, wait_until, Scripted};
use crate::time::ManualClock;

/// Readers never observe a half-built mapping while the source swaps it out.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_whole_generations() {
    let clock = ManualClock::new(0);
    let generation = |n: i64| -> HashMap<u32, i64> { (0..100).map(|k| (k, n)).collect() };
    let src = Scripted::with_delay(
        (0..20).map(|n| Some(generation(n))).collect(),
        Duration::from_millis(2),
    );
    let s = src.clone();
    let map = Arc::new(Map::with_options(move || s.next(), manual_options(&clock, 10)).unwrap());
    map.size();

    let writer = {
        let map = map.clone();
        let clock = clock.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..19 {
                clock.advance(10);
                map.build(false);
            }
        })
    };

    let mut readers = vec![];
    for _ in 0..4 {
        let map = map.clone();
        readers.push(tokio::task::spawn_blocking(move || {
            for _ in 0..200 {
                let copy = map.copy();
                assert_eq!(copy.len(), 100);
                let first = copy[&0];
                assert!(copy.values().all(|v| *v == first));
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

/// A read inside the prebuild window returns at once while the rebuild runs.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_prebuild_does_not_block_membership_checks() {
    let clock = ManualClock::new(0);
    let src = Scripted::with_delay(vec![Some(vec!["a"]), Some(vec!["b"])], Duration::from_millis(300));
    let s = src.clone();
    let set = Set::with_options(move || s.next(), manual_options(&clock, 100)).unwrap();

    assert!(set.has(&"a"));
    clock.set(95);

    let started = std::time::Instant::now();
    assert_eq!(set.build(false), Gate::Scheduled);
    assert!(started.elapsed() < Duration::from_millis(200));

    assert!(wait_until(Duration::from_secs(3), || set.expired_at() == 195).await);
    assert!(set.has(&"b"));
    assert!(!set.has(&"a"));
}
