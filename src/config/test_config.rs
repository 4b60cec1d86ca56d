use super::{CacheConfig, Config, Logs};
use std::collections::BTreeMap;
use std::time::Duration;

/// Creates a new test configuration with two short-lived caches.
pub fn new_test_config() -> Config {
    let mut caches = BTreeMap::new();
    caches.insert(
        "users".to_string(),
        CacheConfig {
            ttl: Duration::from_secs(10),
            check_interval: Some(Duration::from_secs(1)),
        },
    );
    caches.insert(
        "tags".to_string(),
        CacheConfig {
            ttl: Duration::from_secs(60),
            check_interval: None,
        },
    );

    Config {
        env: super::TEST.to_string(),
        logs: Some(Logs {
            level: Some("debug".to_string()),
        }),
        caches,
    }
}
